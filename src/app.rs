use std::time::Duration;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

use phia::{ApiClient, ApiResult, ChatReply, ChatSession, Dashboard, PollUpdate, Poller};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Session state of the dashboard, built at startup and dropped on exit.
pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Polled state
    pub dashboard: Dashboard,

    // Chat state
    pub chat: ChatSession,
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    chat_lines: u16,      // Wrapped line count from the last render
    chat_follow: bool,    // Keep the newest entry in view

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Chat area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    client: ApiClient,
    events: mpsc::UnboundedSender<AppEvent>,
    poller: Option<Poller>,
}

impl App {
    pub fn new(client: ApiClient, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,

            dashboard: Dashboard::new(),

            chat: ChatSession::new(),
            chat_scroll: 0,
            chat_height: 0,
            chat_lines: 0,
            chat_follow: true,

            animation_frame: 0,

            chat_area: None,

            client,
            events,
            poller: None,
        }
    }

    pub fn api_url(&self) -> &str {
        self.client.base_url()
    }

    /// Start the status/health poller. Replaces any running one.
    pub fn start_polling(&mut self, interval: Duration) {
        self.poller = Some(Poller::spawn(self.client.clone(), interval, self.events.clone()));
    }

    /// Poll again now
    pub fn refresh(&self) {
        if let Some(poller) = &self.poller {
            poller.refresh();
        }
    }

    pub fn apply_poll(&mut self, update: PollUpdate) {
        self.dashboard.apply(update);
    }

    /// Submit the chat input and send it to the backend in the background.
    /// The reply comes back as `AppEvent::ChatReply`.
    pub fn submit_chat(&mut self) -> bool {
        let Some(pending) = self.chat.submit() else {
            return false;
        };

        debug!(request_id = %pending.request_id, "Sending chat message");

        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = client.send_chat_message(&pending.message).await;
            let _ = events.send(AppEvent::ChatReply {
                request_id: pending.request_id,
                result,
            });
        });
        true
    }

    pub fn apply_chat_reply(&mut self, request_id: Uuid, result: ApiResult<ChatReply>) {
        if self.chat.resolve(request_id, result) {
            self.scroll_chat_to_bottom();
        }
    }

    pub fn new_conversation(&mut self) {
        info!("Starting a new conversation");
        self.chat.reset();
        self.chat_scroll = 0;
        self.chat_follow = true;
        self.input_mode = InputMode::Editing;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_awaiting_reply() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll());
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_to_top(&mut self) {
        self.chat_follow = false;
        self.chat_scroll = 0;
    }

    /// Scroll chat to bottom and stay there as new lines are rendered
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_follow = true;
        self.chat_scroll = self.max_chat_scroll();
    }

    /// Record the wrapped height of the transcript as the chat panel
    /// renders it. Called by the renderer before the panel is drawn.
    pub fn set_chat_lines(&mut self, lines: u16) {
        self.chat_lines = lines;
        self.chat_scroll = if self.chat_follow {
            self.max_chat_scroll()
        } else {
            self.chat_scroll.min(self.max_chat_scroll())
        };
    }

    fn max_chat_scroll(&self) -> u16 {
        self.chat_lines.saturating_sub(self.chat_height)
    }

    /// Stop background work. The poller is aborted; in-flight chat requests
    /// finish on their own and their replies go nowhere.
    pub fn shutdown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phia::{ChatState, StatusIndicator};

    async fn unreachable_client() -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        ApiClient::new(&format!("http://{addr}"), Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn failed_chat_round_trip_appends_fallback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(unreachable_client().await, tx);

        app.chat.set_input("How can I reduce stress?");
        assert!(app.submit_chat());
        assert!(app.chat.is_awaiting_reply());
        assert!(!app.submit_chat());

        let Some(AppEvent::ChatReply { request_id, result }) = rx.recv().await else {
            panic!("expected a chat reply event");
        };
        assert!(!result.is_data());
        app.apply_chat_reply(request_id, result);

        let transcript = app.chat.transcript();
        assert_eq!(transcript.len(), 3);
        assert!(transcript[1].is_user);
        assert_eq!(transcript[2].body(), phia::chat::FALLBACK_REPLY);
        assert_eq!(app.chat.state(), ChatState::Idle);
    }

    #[tokio::test]
    async fn polling_unreachable_backend_shows_disconnected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut app = App::new(unreachable_client().await, tx);
        app.start_polling(Duration::from_secs(3600));

        let Some(AppEvent::Poll(update)) = rx.recv().await else {
            panic!("expected a poll event");
        };
        app.apply_poll(update);
        assert_eq!(app.dashboard.indicator, StatusIndicator::Disconnected);
        assert!(app.dashboard.summary.is_none());

        app.shutdown();
    }

    #[tokio::test]
    async fn scrolling_is_bounded_by_rendered_lines() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut app = App::new(unreachable_client().await, tx);
        app.chat_height = 4;
        app.set_chat_lines(10);
        assert_eq!(app.chat_scroll, 6);

        app.scroll_chat_up(10);
        assert_eq!(app.chat_scroll, 0);
        app.scroll_chat_down(100);
        assert_eq!(app.chat_scroll, 6);

        // Not following: more content keeps the position
        app.scroll_chat_up(2);
        app.set_chat_lines(14);
        assert_eq!(app.chat_scroll, 4);

        app.scroll_chat_to_bottom();
        assert_eq!(app.chat_scroll, 10);
        app.set_chat_lines(16);
        assert_eq!(app.chat_scroll, 12);

        app.scroll_chat_to_top();
        app.set_chat_lines(20);
        assert_eq!(app.chat_scroll, 0);
    }
}

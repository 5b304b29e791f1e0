//! Chat session: transcript, input line and the Idle/AwaitingReply machine.

use chrono::Local;
use tracing::warn;
use uuid::Uuid;

use crate::api::ApiResult;
use crate::models::{parse_timestamp, ChatMessage, ChatReply};

pub const GREETING: &str = "Hello! I'm PHIA, your Personal Health Insights Agent. I can analyze your health data and provide personalized recommendations. Try asking me about your sleep, exercise, or overall health!";

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an issue. Please try again.";

pub const SUGGESTED_QUESTIONS: [&str; 4] = [
    "How can I improve my sleep quality?",
    "What's my heart rate trend?",
    "Am I getting enough exercise?",
    "How can I reduce stress?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingReply { request_id: Uuid },
}

/// A submitted message that still needs to be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChat {
    /// Id of the user entry, echoed back to `ChatSession::resolve`
    pub request_id: Uuid,
    pub message: String,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Vec<ChatMessage>,
    state: ChatState,
    input: String,
    cursor: usize, // char position in input
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            transcript: vec![ChatMessage::assistant(GREETING, Local::now(), None)],
            state: ChatState::Idle,
            input: String::new(),
            cursor: 0,
        }
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        &self.transcript
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_awaiting_reply(&self) -> bool {
        matches!(self.state, ChatState::AwaitingReply { .. })
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn has_user_message(&self) -> bool {
        self.transcript.iter().any(|m| m.is_user)
    }

    /// Suggested questions, offered only before the first user message.
    pub fn suggestions(&self) -> &'static [&'static str] {
        if self.has_user_message() {
            &[]
        } else {
            &SUGGESTED_QUESTIONS
        }
    }

    /// Prefill the input with a suggested question. Returns false if the
    /// suggestion is not on offer.
    pub fn apply_suggestion(&mut self, idx: usize) -> bool {
        if self.is_awaiting_reply() {
            return false;
        }
        match self.suggestions().get(idx) {
            Some(question) => {
                self.set_input(question);
                true
            }
            None => false,
        }
    }

    /// Turn the current input into a user entry and a pending request.
    ///
    /// Returns `None` (and changes nothing) when the trimmed input is empty or
    /// a reply is still outstanding.
    pub fn submit(&mut self) -> Option<PendingChat> {
        if self.is_awaiting_reply() {
            return None;
        }
        let message = self.input.trim();
        if message.is_empty() {
            return None;
        }

        let entry = ChatMessage::user(message);
        let pending = PendingChat {
            request_id: entry.id,
            message: entry.text.clone(),
        };
        self.transcript.push(entry);
        self.input.clear();
        self.cursor = 0;
        self.state = ChatState::AwaitingReply {
            request_id: pending.request_id,
        };
        Some(pending)
    }

    /// Append the assistant turn for `request_id` and return to idle.
    ///
    /// A failed call appends `FALLBACK_REPLY`. Replies for a request that is
    /// not the one being awaited (the conversation was reset meanwhile) are
    /// discarded; returns whether the reply was applied.
    pub fn resolve(&mut self, request_id: Uuid, result: ApiResult<ChatReply>) -> bool {
        match self.state {
            ChatState::AwaitingReply { request_id: awaited } if awaited == request_id => {}
            _ => {
                warn!(%request_id, "Discarding chat reply for a request that is no longer pending");
                return false;
            }
        }

        let entry = match result {
            ApiResult::Data(reply) => {
                let timestamp = parse_timestamp(&reply.timestamp).unwrap_or_else(Local::now);
                ChatMessage::assistant(reply.response, timestamp, Some(request_id))
            }
            ApiResult::Error(_) => ChatMessage::assistant(FALLBACK_REPLY, Local::now(), Some(request_id)),
        };
        self.transcript.push(entry);
        self.state = ChatState::Idle;
        true
    }

    /// Start a new conversation. Any outstanding reply will be discarded.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // Input editing. All of these are no-ops while a reply is outstanding.

    pub fn set_input(&mut self, text: &str) {
        if self.is_awaiting_reply() {
            return;
        }
        self.input = text.to_string();
        self.cursor = self.input.chars().count();
    }

    pub fn insert_char(&mut self, c: char) {
        if self.is_awaiting_reply() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.is_awaiting_reply() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.is_awaiting_reply() {
            return;
        }
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(text: &str) -> ApiResult<ChatReply> {
        ApiResult::Data(ChatReply {
            response: text.to_string(),
            timestamp: "2024-03-05T14:07:09".to_string(),
        })
    }

    fn typed(text: &str) -> ChatSession {
        let mut session = ChatSession::new();
        session.set_input(text);
        session
    }

    #[test]
    fn starts_idle_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.state(), ChatState::Idle);
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.transcript()[0].body(), GREETING);
        assert!(!session.transcript()[0].is_user);
        assert_eq!(session.suggestions().len(), 4);
    }

    #[test]
    fn submit_then_resolve_appends_user_then_assistant() {
        let mut session = typed("  How can I improve my sleep?  ");
        let pending = session.submit().expect("submitted");

        assert_eq!(pending.message, "How can I improve my sleep?");
        assert_eq!(session.transcript().len(), 2);
        assert!(session.transcript()[1].is_user);
        assert_eq!(session.transcript()[1].id, pending.request_id);
        assert!(session.input().is_empty());
        assert_eq!(
            session.state(),
            ChatState::AwaitingReply { request_id: pending.request_id }
        );

        assert!(session.resolve(pending.request_id, reply("Keep a regular schedule.")));
        assert_eq!(session.transcript().len(), 3);
        let answer = &session.transcript()[2];
        assert!(!answer.is_user);
        assert_eq!(answer.body(), "Keep a regular schedule.");
        assert_eq!(answer.in_reply_to, Some(pending.request_id));
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[test]
    fn empty_or_whitespace_input_is_ignored() {
        for input in ["", "   ", "\t\n"] {
            let mut session = typed(input);
            assert!(session.submit().is_none());
            assert_eq!(session.transcript().len(), 1);
            assert_eq!(session.state(), ChatState::Idle);
        }
    }

    #[test]
    fn submit_while_awaiting_is_ignored() {
        let mut session = typed("first");
        session.submit().unwrap();

        session.set_input("second");
        session.insert_char('x');
        assert!(session.input().is_empty());
        assert!(session.submit().is_none());
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn failed_call_appends_fallback() {
        let mut session = typed("hello");
        let pending = session.submit().unwrap();

        session.resolve(pending.request_id, ApiResult::Error("HTTP error! status: 500".into()));

        let last = session.transcript().last().unwrap();
        assert!(!last.is_user);
        assert_eq!(last.body(), FALLBACK_REPLY);
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[test]
    fn reply_after_reset_is_discarded() {
        let mut session = typed("hello");
        let pending = session.submit().unwrap();
        session.reset();

        assert!(!session.resolve(pending.request_id, reply("late")));
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.state(), ChatState::Idle);
    }

    #[test]
    fn unmatched_reply_is_discarded() {
        let mut session = typed("hello");
        let pending = session.submit().unwrap();

        assert!(!session.resolve(Uuid::new_v4(), reply("stray")));
        assert_eq!(session.transcript().len(), 2);
        assert!(session.is_awaiting_reply());

        assert!(session.resolve(pending.request_id, reply("real")));
        assert_eq!(session.transcript().last().unwrap().body(), "real");
    }

    #[test]
    fn transcript_keeps_order_across_turns() {
        let mut session = ChatSession::new();
        for (question, answer) in [("q1", "a1"), ("q2", "a2"), ("q3", "a3")] {
            session.set_input(question);
            let pending = session.submit().unwrap();
            session.resolve(pending.request_id, reply(answer));
        }

        let bodies: Vec<&str> = session.transcript().iter().map(|m| m.body()).collect();
        assert_eq!(bodies, vec![GREETING, "q1", "a1", "q2", "a2", "q3", "a3"]);
        let ids: std::collections::HashSet<Uuid> =
            session.transcript().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 7);
    }

    #[test]
    fn suggestions_only_before_first_user_message() {
        let mut session = ChatSession::new();
        assert!(session.apply_suggestion(2));
        assert_eq!(session.input(), SUGGESTED_QUESTIONS[2]);
        assert_eq!(session.transcript().len(), 1);

        let pending = session.submit().unwrap();
        assert!(session.suggestions().is_empty());
        session.resolve(pending.request_id, reply("ok"));
        assert!(!session.apply_suggestion(0));
        assert!(session.input().is_empty());
    }

    #[test]
    fn apply_suggestion_out_of_range() {
        let mut session = ChatSession::new();
        assert!(!session.apply_suggestion(4));
        assert!(session.input().is_empty());
    }

    #[test]
    fn editing_respects_char_boundaries() {
        let mut session = ChatSession::new();
        for c in "héllo".chars() {
            session.insert_char(c);
        }
        session.cursor_home();
        session.cursor_right();
        session.cursor_right();
        session.backspace();
        assert_eq!(session.input(), "hllo");
        assert_eq!(session.cursor(), 1);

        session.delete();
        assert_eq!(session.input(), "hlo");

        session.cursor_end();
        session.insert_char('!');
        assert_eq!(session.input(), "hlo!");
    }
}

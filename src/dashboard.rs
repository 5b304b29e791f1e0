//! Status indicator and health summary state, plus the task that polls them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::{ApiClient, ApiResult};
use crate::metrics::{metrics_view, MetricsView};
use crate::models::{ApiStatus, HealthSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusIndicator {
    /// No poll has completed yet
    Checking,
    Connected,
    Disconnected,
}

impl StatusIndicator {
    pub fn label(&self) -> &'static str {
        match self {
            StatusIndicator::Checking => "Checking",
            StatusIndicator::Connected => "Connected",
            StatusIndicator::Disconnected => "Disconnected",
        }
    }
}

/// Results of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollUpdate {
    /// Cycle number, starting at 1 and increasing by one per cycle
    pub seq: u64,
    pub status: ApiResult<ApiStatus>,
    pub health: ApiResult<HealthSummary>,
}

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub indicator: StatusIndicator,
    /// Last successful status report, kept across failed polls
    pub last_status: Option<ApiStatus>,
    pub summary: Option<HealthSummary>,
    pub loading: bool,
    pub last_polled: Option<DateTime<Local>>,
    pub last_error: Option<String>,
    last_seq: u64,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard {
    pub fn new() -> Self {
        Self {
            indicator: StatusIndicator::Checking,
            last_status: None,
            summary: None,
            loading: true,
            last_polled: None,
            last_error: None,
            last_seq: 0,
        }
    }

    /// Apply a poll cycle. Cycles older than the last applied one are
    /// ignored; returns whether the update was applied.
    pub fn apply(&mut self, update: PollUpdate) -> bool {
        if update.seq <= self.last_seq {
            debug!(seq = update.seq, last = self.last_seq, "Ignoring stale poll update");
            return false;
        }
        self.last_seq = update.seq;
        self.last_error = None;

        match update.status {
            ApiResult::Data(status) => {
                self.indicator = if status.is_running() {
                    StatusIndicator::Connected
                } else {
                    StatusIndicator::Disconnected
                };
                self.last_status = Some(status);
            }
            ApiResult::Error(message) => {
                self.indicator = StatusIndicator::Disconnected;
                self.last_error = Some(message);
            }
        }

        match update.health {
            ApiResult::Data(summary) => self.summary = Some(summary),
            ApiResult::Error(message) => {
                self.summary = None;
                if self.last_error.is_none() {
                    self.last_error = Some(message);
                }
            }
        }

        self.loading = false;
        self.last_polled = Some(Local::now());
        true
    }

    pub fn metrics(&self) -> MetricsView {
        metrics_view(self.summary.as_ref(), self.loading)
    }
}

/// Run one poll cycle: status first, then the health summary.
pub async fn poll_once(client: &ApiClient, seq: u64) -> PollUpdate {
    let status = client.get_status().await;
    let health = client.get_health_summary().await;
    debug!(seq, status_ok = status.is_data(), health_ok = health.is_data(), "Poll cycle finished");
    PollUpdate { seq, status, health }
}

/// Background task polling the backend at a fixed cadence.
///
/// Polls once immediately, then every `interval`. The task is aborted when
/// the handle is dropped.
pub struct Poller {
    task: JoinHandle<()>,
    refresh: Arc<Notify>,
}

impl Poller {
    pub fn spawn<E>(client: ApiClient, interval: Duration, tx: mpsc::UnboundedSender<E>) -> Self
    where
        E: From<PollUpdate> + Send + 'static,
    {
        let refresh = Arc::new(Notify::new());
        let refresh_rx = refresh.clone();

        info!(base_url = client.base_url(), interval_secs = interval.as_secs(), "Starting poller");

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut seq = 0;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = refresh_rx.notified() => {}
                }

                seq += 1;
                let update = poll_once(&client, seq).await;
                if tx.send(update.into()).is_err() {
                    break;
                }
            }
        });

        Self { task, refresh }
    }

    /// Request an extra poll cycle now. The regular cadence is unchanged.
    pub fn refresh(&self) {
        self.refresh.notify_one();
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

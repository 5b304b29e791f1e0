pub mod api;
pub mod chat;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod logging;
pub mod metrics;
pub mod models;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError, ApiResult, RequestOptions};
pub use chat::{ChatSession, ChatState, PendingChat};
pub use config::Config;
pub use dashboard::{Dashboard, PollUpdate, Poller, StatusIndicator};
pub use metrics::{metrics_view, MetricCard, MetricsView};
pub use models::{ApiStatus, ChatMessage, ChatReply, ChatRequest, HealthSummary};

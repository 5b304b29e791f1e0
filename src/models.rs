//! Wire and domain types shared by the dashboard, the chat panel and the
//! one-shot commands.
//!
//! Nothing in here depends on a UI framework or on the HTTP client.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of current vital and activity metrics as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub heart_rate: u32,
    pub steps: u32,
    pub sleep: String,
    pub active_minutes: u32,
    #[serde(default)]
    pub calories: u32,
}

/// Response of `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiStatus {
    pub status: String,
    #[serde(default)]
    pub phia_agent: String,
    #[serde(default)]
    pub timestamp: String,
}

impl ApiStatus {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Response of `POST /api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub timestamp: String,
}

/// One entry of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    /// User-authored text, empty for assistant entries
    pub text: String,
    /// Assistant reply, empty for user entries
    pub response: String,
    pub timestamp: DateTime<Local>,
    pub is_user: bool,
    /// Id of the user entry this assistant entry answers
    pub in_reply_to: Option<Uuid>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            response: String::new(),
            timestamp: Local::now(),
            is_user: true,
            in_reply_to: None,
        }
    }

    pub fn assistant(
        response: impl Into<String>,
        timestamp: DateTime<Local>,
        in_reply_to: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: String::new(),
            response: response.into(),
            timestamp,
            is_user: false,
            in_reply_to,
        }
    }

    /// The text shown for this entry, whichever side authored it.
    pub fn body(&self) -> &str {
        if self.is_user {
            &self.text
        } else {
            &self.response
        }
    }
}

/// Parse a backend ISO-8601 timestamp.
///
/// Accepts RFC 3339 (with offset) and naive `YYYY-MM-DDTHH:MM:SS[.fff]`,
/// which is read as local time.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local.from_local_datetime(&naive).earliest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn health_summary_reads_camel_case() {
        let json = r#"{"heartRate":72,"steps":8543,"sleep":"7h 30m","activeMinutes":45,"calories":2100}"#;
        let summary: HealthSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.heart_rate, 72);
        assert_eq!(summary.steps, 8543);
        assert_eq!(summary.sleep, "7h 30m");
        assert_eq!(summary.active_minutes, 45);
        assert_eq!(summary.calories, 2100);
    }

    #[test]
    fn health_summary_defaults_missing_calories() {
        let json = r#"{"heartRate":60,"steps":0,"sleep":"7.2h","activeMinutes":0}"#;
        let summary: HealthSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.calories, 0);
    }

    #[test]
    fn health_summary_rejects_missing_metric() {
        let json = r#"{"heartRate":60,"sleep":"7.2h","activeMinutes":0}"#;
        assert!(serde_json::from_str::<HealthSummary>(json).is_err());
    }

    #[test]
    fn status_running_check() {
        let status: ApiStatus =
            serde_json::from_str(r#"{"status":"running","phia_agent":"fallback","timestamp":"x"}"#)
                .unwrap();
        assert!(status.is_running());

        let status: ApiStatus = serde_json::from_str(r#"{"status":"degraded"}"#).unwrap();
        assert!(!status.is_running());
        assert!(status.phia_agent.is_empty());
    }

    #[test]
    fn body_picks_authored_side() {
        let user = ChatMessage::user("How did I sleep?");
        assert!(user.is_user);
        assert_eq!(user.body(), "How did I sleep?");

        let reply = ChatMessage::assistant("About 7 hours.", Local::now(), Some(user.id));
        assert!(!reply.is_user);
        assert_eq!(reply.body(), "About 7 hours.");
        assert_eq!(reply.in_reply_to, Some(user.id));
        assert_ne!(reply.id, user.id);
    }

    #[test]
    fn parses_naive_backend_timestamp() {
        let ts = parse_timestamp("2024-03-05T14:07:09.123456").unwrap();
        assert_eq!(ts.year(), 2024);
        assert_eq!(ts.month(), 3);
        assert_eq!(ts.day(), 5);
        assert_eq!(ts.hour(), 14);
        assert_eq!(ts.minute(), 7);
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let ts = parse_timestamp("2024-03-05T14:07:09Z").unwrap();
        let utc = ts.with_timezone(&chrono::Utc);
        assert_eq!(utc.hour(), 14);
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }
}

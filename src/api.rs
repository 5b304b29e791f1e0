use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use crate::models::{ApiStatus, ChatReply, ChatRequest, HealthSummary};

pub const STATUS_ENDPOINT: &str = "/api/status";
pub const HEALTH_SUMMARY_ENDPOINT: &str = "/api/health/summary";
pub const CHAT_ENDPOINT: &str = "/api/chat";

/// Outcome of a backend call: a value or a human-readable error, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResult<T> {
    Data(T),
    Error(String),
}

impl<T> ApiResult<T> {
    pub fn is_data(&self) -> bool {
        matches!(self, ApiResult::Data(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            ApiResult::Data(value) => Some(value),
            ApiResult::Error(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ApiResult::Data(_) => None,
            ApiResult::Error(message) => Some(message),
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            ApiResult::Data(value) => Some(value),
            ApiResult::Error(_) => None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for ApiResult<T> {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(value) => ApiResult::Data(value),
            Err(e) => ApiResult::Error(e.to_string()),
        }
    }
}

/// Failures inside the client. They all collapse to `ApiResult::Error`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(#[source] reqwest::Error),
    #[error("HTTP error! status: {}", .0.as_u16())]
    Status(StatusCode),
    #[error("invalid response body: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issue a call against the configured backend.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies all come
    /// back as `ApiResult::Error` and are logged here.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let result = self.fetch(endpoint, options).await;
        if let Err(e) = &result {
            error!(endpoint, error = %e, "API request failed");
        }
        result.into()
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!(method = %options.method, %url, "API request");

        let mut request = self
            .client
            .request(options.method, &url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(ApiError::Transport)?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status()));
        }

        response.json::<T>().await.map_err(ApiError::Decode)
    }

    pub async fn get_status(&self) -> ApiResult<ApiStatus> {
        self.request(STATUS_ENDPOINT, RequestOptions::get()).await
    }

    pub async fn get_health_summary(&self) -> ApiResult<HealthSummary> {
        self.request(HEALTH_SUMMARY_ENDPOINT, RequestOptions::get())
            .await
    }

    pub async fn send_chat_message(&self, message: &str) -> ApiResult<ChatReply> {
        let body = ChatRequest {
            message: message.to_string(),
        };
        match serde_json::to_value(&body) {
            Ok(body) => self.request(CHAT_ENDPOINT, RequestOptions::post(body)).await,
            Err(e) => ApiResult::Error(e.to_string()),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{self, Stub};
    use super::*;
    use axum::http::StatusCode as AxumStatus;
    use serde_json::json;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_health_summary() {
        let base = test_server::spawn(Stub::default()).await;
        let result = client(&base).get_health_summary().await;

        let summary = result.data().expect("summary");
        assert_eq!(summary.heart_rate, 72);
        assert_eq!(summary.steps, 8543);
        assert_eq!(summary.sleep, "7h 30m");
        assert_eq!(summary.active_minutes, 45);
    }

    #[tokio::test]
    async fn fetches_status() {
        let base = test_server::spawn(Stub::default()).await;
        let status = client(&base).get_status().await.into_data().unwrap();
        assert!(status.is_running());
        assert_eq!(status.phia_agent, "available");
    }

    #[tokio::test]
    async fn posts_chat_message_body() {
        let stub = Stub::default();
        let received = stub.received.clone();
        let base = test_server::spawn(stub).await;

        let reply = client(&base)
            .send_chat_message("How can I sleep better?")
            .await
            .into_data()
            .unwrap();

        assert_eq!(reply.response, "Aim for 7-9 hours.");
        let bodies = received.lock().unwrap();
        assert_eq!(bodies.as_slice(), &[json!({"message": "How can I sleep better?"})]);
    }

    #[tokio::test]
    async fn non_success_status_is_error() {
        let stub = Stub {
            chat: (AxumStatus::INTERNAL_SERVER_ERROR, json!({"response": "boom", "error": "boom"})),
            ..Stub::default()
        };
        let base = test_server::spawn(stub).await;

        let result = client(&base).send_chat_message("hi").await;
        assert_eq!(result, ApiResult::Error("HTTP error! status: 500".to_string()));
    }

    #[tokio::test]
    async fn malformed_body_is_error() {
        let stub = Stub {
            summary: (AxumStatus::OK, json!({"unexpected": true})),
            ..Stub::default()
        };
        let base = test_server::spawn(stub).await;

        let result = client(&base).get_health_summary().await;
        assert!(!result.is_data());
        assert!(result.error().unwrap().starts_with("invalid response body"));
    }

    #[tokio::test]
    async fn unreachable_backend_is_error() {
        let base = test_server::dead_url().await;
        let result = client(&base).get_status().await;
        assert!(result.error().is_some());
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let client = client("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
    }

    #[test]
    fn request_options_default_to_get() {
        let options = RequestOptions::default();
        assert_eq!(options.method, Method::GET);
        assert!(options.body.is_none());

        let options = RequestOptions::post(json!({"message": "x"}));
        assert_eq!(options.method, Method::POST);
    }
}

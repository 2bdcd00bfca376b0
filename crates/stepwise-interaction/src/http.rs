//! Shared reqwest plumbing: base URL joining, bearer auth and error mapping.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use stepwise_core::error::{Result, StepwiseError};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path)).timeout(DEFAULT_TIMEOUT)
    }

    /// POST without a request timeout; streamed replies may stay open for a long time.
    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Sends `request` and maps transport failures and non-2xx statuses.
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(map_http_error(status, &body))
    }

    /// GETs `path` and returns the parsed JSON body.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let response = self.send(self.get(path)).await?;
        response.json::<Value>().await.map_err(|e| {
            StepwiseError::invalid_payload(format!("Failed to decode {} response: {}", path, e))
        })
    }
}

pub fn bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
    if token.is_empty() {
        request
    } else {
        request.header("Authorization", format!("Bearer {}", token))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Message(String),
    Nested { message: String },
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    #[serde(alias = "detail", alias = "message")]
    error: ErrorField,
}

/// Extracts the message of a `{"error": ...}` / `{"detail": ...}` envelope.
pub fn error_envelope_message(body: &Value) -> Option<String> {
    let envelope = serde_json::from_value::<ErrorEnvelope>(body.clone()).ok()?;
    Some(match envelope.error {
        ErrorField::Message(message) => message,
        ErrorField::Nested { message } => message,
    })
}

pub fn map_http_error(status: StatusCode, body: &str) -> StepwiseError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| error_envelope_message(&value))
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.trim().to_string()
            }
        });

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StepwiseError::Unauthorized(message),
        _ => StepwiseError::backend(Some(status.as_u16()), message),
    }
}

pub fn map_transport_error(err: reqwest::Error) -> StepwiseError {
    if err.is_timeout() {
        StepwiseError::network(format!("Request timed out: {}", err))
    } else if err.is_connect() {
        StepwiseError::network(format!("Cannot reach the server: {}", err))
    } else {
        StepwiseError::network(err.to_string())
    }
}

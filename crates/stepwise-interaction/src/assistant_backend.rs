//! Chat, validation and health endpoints of the Stepwise backend.

use crate::http::{ApiClient, bearer, error_envelope_message};
use crate::sse::SseDecoder;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use serde_json::Value;
use std::collections::VecDeque;
use stepwise_core::assistant::{
    AssistantBackend, ChatEvent, ChatRequest, ChatStream, ValidationOutcome, ValidationRequest,
};
use stepwise_core::error::{Result, StepwiseError};

const CHAT_STREAM_PATH: &str = "/api/chat/stream";
const VALIDATE_PATH: &str = "/api/validation/validate";
const HEALTH_PATH: &str = "/api/health";

pub struct HttpAssistantBackend {
    api: ApiClient,
}

impl HttpAssistantBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AssistantBackend for HttpAssistantBackend {
    async fn stream_chat(&self, request: &ChatRequest, token: &str) -> Result<ChatStream> {
        tracing::debug!(
            "[AssistantBackend] Opening chat stream for {}/{}/{}",
            request.task_id,
            request.subtask.id,
            request.step.id
        );
        let builder = bearer(self.api.post(CHAT_STREAM_PATH), token)
            .header("Accept", "text/event-stream")
            .json(request);
        let response = self.api.send(builder).await?;
        Ok(decode_event_stream(response.bytes_stream().boxed()))
    }

    async fn validate(&self, request: &ValidationRequest, token: &str) -> Result<ValidationOutcome> {
        tracing::debug!(
            "[AssistantBackend] Validating submission for step {}",
            request.step.id
        );
        let builder = bearer(self.api.post(VALIDATE_PATH), token).json(request);
        let response = self.api.send(builder).await?;
        let status = response.status().as_u16();
        let body: Value = response.json().await.map_err(|e| {
            StepwiseError::invalid_payload(format!("Failed to decode validation response: {}", e))
        })?;
        parse_validation(status, body)
    }

    async fn health_check(&self) -> Result<()> {
        self.api.send(self.api.get(HEALTH_PATH)).await.map(|_| ())
    }
}

/// Interprets a 2xx validation body, which may still be an error envelope.
pub fn parse_validation(status: u16, body: Value) -> Result<ValidationOutcome> {
    if let Some(message) = error_envelope_message(&body) {
        return Err(StepwiseError::backend(Some(status), message));
    }
    if !body.is_object() {
        return Err(StepwiseError::invalid_payload(
            "validation response is not an object",
        ));
    }
    serde_json::from_value(body).map_err(|e| {
        StepwiseError::invalid_payload(format!("Malformed validation response: {}", e))
    })
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<ChatEvent>>,
    finished: bool,
}

/// Turns a response body into decoded chat events.
///
/// The stream ends after the first `End` or error; a transport failure is
/// yielded once as a `Network` error.
pub fn decode_event_stream(body: BoxStream<'static, reqwest::Result<Bytes>>) -> ChatStream {
    let state = StreamState {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(event) = state.pending.pop_front() {
                if matches!(event, Ok(ChatEvent::End) | Err(_)) {
                    state.pending.clear();
                    state.finished = true;
                }
                return Some((event, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => state.pending.extend(state.decoder.push(&chunk)),
                Some(Err(e)) => {
                    state.finished = true;
                    return Some((Err(StepwiseError::network(format!("Stream error: {}", e))), state));
                }
                None => {
                    state.pending.extend(state.decoder.finish());
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

//! Chat/validation backend trait.

use super::model::{ChatEvent, ChatRequest, ValidationOutcome, ValidationRequest};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Decoded chat frames, in arrival order. Dropping the stream closes the connection.
pub type ChatStream = BoxStream<'static, Result<ChatEvent>>;

/// The remote service that role-plays the AI team and grades submissions.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Opens a streamed reply for `request`.
    ///
    /// # Errors
    ///
    /// `Unauthorized` for rejected tokens, `Backend`/`Network` otherwise.
    async fn stream_chat(&self, request: &ChatRequest, token: &str) -> Result<ChatStream>;

    /// Grades a submission. An error envelope from the server is returned as `Backend`.
    async fn validate(&self, request: &ValidationRequest, token: &str) -> Result<ValidationOutcome>;

    /// Cheap reachability probe used by the connectivity monitor.
    async fn health_check(&self) -> Result<()>;
}

//! Transcript repository trait.

use super::model::{ChatMessage, TranscriptKey, TranscriptSummary};
use crate::error::Result;
use async_trait::async_trait;

/// Append-only chat log per (user, task, subtask, step).
///
/// # Implementation Notes
///
/// Appends must be additive on the store side so that concurrent callers do
/// not lose each other's messages. Messages keep insertion order.
#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    /// Returns the messages in insertion order; empty when no transcript exists.
    async fn get_messages(&self, key: &TranscriptKey) -> Result<Vec<ChatMessage>>;

    /// Appends one message, creating the transcript on first use.
    ///
    /// Fails with `InvalidMessage` when the message has no id or content.
    async fn append_message(&self, key: &TranscriptKey, message: &ChatMessage) -> Result<()>;

    /// Synthesizes and appends the greeting for a step the learner opens for the first time.
    async fn create_welcome_message(
        &self,
        key: &TranscriptKey,
        task_name: &str,
        step_objective: &str,
    ) -> Result<ChatMessage>;

    /// Returns count and last update, or `None` when no transcript exists.
    async fn get_summary(&self, key: &TranscriptKey) -> Result<Option<TranscriptSummary>>;

    /// Empties the transcript. Destructive; not part of the normal chat flow.
    async fn reset(&self, key: &TranscriptKey) -> Result<()>;
}

//! Progress repository trait (the remote progress gateway).

use super::document::ProgressDocument;
use crate::catalog::Task;
use crate::error::Result;
use crate::location::StepLocation;
use async_trait::async_trait;

/// Reads and patches a learner's per-task progress document.
///
/// Every write touches only the fields it names plus the document
/// `updatedAt`, so position and completion writes never clobber each other.
///
/// # Implementation Notes
///
/// Callers treat failures as best-effort: the in-memory state stays
/// authoritative for the running session.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Loads the document for `(user_id, task_id)`.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(doc))`: The learner has started this task
    /// - `Ok(None)`: Never started
    /// - `Err(_)`: The store could not be read
    async fn fetch(&self, user_id: &str, task_id: &str) -> Result<Option<ProgressDocument>>;

    /// Writes a freshly seeded document for `task`.
    ///
    /// Fails with `AlreadyExists` instead of overwriting an existing document.
    async fn initialize(&self, user_id: &str, task: &Task) -> Result<ProgressDocument>;

    /// Sets `currentPosition` to the given step and bumps `updatedAt`.
    async fn update_position(&self, user_id: &str, location: &StepLocation) -> Result<()>;

    /// Sets one step's `isCompleted` (and `studentResponse` when given) and bumps `updatedAt`.
    async fn update_step_completion(
        &self,
        user_id: &str,
        location: &StepLocation,
        is_completed: bool,
        response: Option<&str>,
    ) -> Result<()>;

    /// Increments the step's `chatCount` and stamps `lastChatAt`.
    async fn record_chat_activity(&self, user_id: &str, location: &StepLocation) -> Result<()>;
}

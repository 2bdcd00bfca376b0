//! Catalog source trait.

use super::model::{Task, TeamMember};
use crate::error::Result;
use async_trait::async_trait;

/// Read-only access to the task catalog and the AI team roster.
///
/// Implementations must return normalized values: malformed payloads are
/// reported as `StepwiseError::InvalidPayload`, never passed through.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Loads every task in catalog order.
    async fn fetch_tasks(&self) -> Result<Vec<Task>>;

    /// Loads the team members that appear as chat personas.
    async fn fetch_team_members(&self) -> Result<Vec<TeamMember>>;
}

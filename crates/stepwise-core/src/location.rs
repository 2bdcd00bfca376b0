//! Addressing a single step across the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one step by its task, subtask and step ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepLocation {
    pub task_id: String,
    pub subtask_id: String,
    pub step_id: String,
}

impl StepLocation {
    pub fn new(
        task_id: impl Into<String>,
        subtask_id: impl Into<String>,
        step_id: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            subtask_id: subtask_id.into(),
            step_id: step_id.into(),
        }
    }
}

impl fmt::Display for StepLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.task_id, self.subtask_id, self.step_id)
    }
}

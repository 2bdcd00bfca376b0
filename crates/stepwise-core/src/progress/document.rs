//! Persisted progress document.
//!
//! One document per (user, task). Subtasks and steps are keyed by id so a
//! single step can be patched without rewriting its siblings; the ordinal
//! `number` carried by each entry is what recovers display order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Field names used in the persisted shape, shared with field-path updates.
pub mod fields {
    pub const SUBTASKS: &str = "subtasks";
    pub const STEPS: &str = "steps";
    pub const IS_COMPLETED: &str = "isCompleted";
    pub const STUDENT_RESPONSE: &str = "studentResponse";
    pub const CHAT_COUNT: &str = "chatCount";
    pub const LAST_CHAT_AT: &str = "lastChatAt";
    pub const CURRENT_POSITION: &str = "currentPosition";
    pub const SUBTASK_ID: &str = "subtaskId";
    pub const STEP_ID: &str = "stepId";
    pub const LAST_ACTIVE_AT: &str = "lastActiveAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Entries default missing fields so a step created by a partial field
/// update still deserializes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StepProgress {
    pub id: String,
    pub number: u32,
    pub step: String,
    pub objective: String,
    pub is_completed: bool,
    pub student_response: String,
    pub validation_criteria: Vec<String>,
    pub deliverables: Vec<String>,
    pub primary_agent: String,
    pub chat_count: u32,
    pub last_chat_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubtaskProgress {
    pub id: String,
    pub number: u32,
    pub name: String,
    pub description: String,
    pub steps: HashMap<String, StepProgress>,
}

/// Where the learner was last active inside the task.
///
/// Both ids are `None` only for a task that has no steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPosition {
    pub subtask_id: Option<String>,
    pub step_id: Option<String>,
    pub last_active_at: DateTime<Utc>,
}

impl CurrentPosition {
    /// Returns both ids when the position has been set.
    pub fn ids(&self) -> Option<(&str, &str)> {
        match (&self.subtask_id, &self.step_id) {
            (Some(subtask_id), Some(step_id)) => Some((subtask_id.as_str(), step_id.as_str())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    pub task_id: String,
    pub task_name: String,
    pub task_number: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub subtasks: HashMap<String, SubtaskProgress>,
    pub current_position: CurrentPosition,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressDocument {
    pub fn step(&self, subtask_id: &str, step_id: &str) -> Option<&StepProgress> {
        self.subtasks.get(subtask_id)?.steps.get(step_id)
    }

    /// True when `current_position` names a step that exists in this document.
    pub fn position_is_consistent(&self) -> bool {
        match self.current_position.ids() {
            Some((subtask_id, step_id)) => self.step(subtask_id, step_id).is_some(),
            None => self.subtasks.values().all(|s| s.steps.is_empty()),
        }
    }
}

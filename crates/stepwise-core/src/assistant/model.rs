//! Request and response shapes for the chat and validation backend.

use crate::catalog::{Step, Subtask};
use serde::{Deserialize, Serialize};

/// Subtask context sent along with chat and validation requests (without its steps).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskContext {
    pub id: String,
    pub number: u32,
    pub name: String,
    pub description: String,
}

impl From<&Subtask> for SubtaskContext {
    fn from(subtask: &Subtask) -> Self {
        Self {
            id: subtask.id.clone(),
            number: subtask.number,
            name: subtask.name.clone(),
            description: subtask.description.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub task_id: String,
    pub subtask: SubtaskContext,
    pub step: Step,
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<String>,
}

/// One decoded frame of the chat stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The backend picked the team member answering this turn.
    Start { agent: Option<String> },
    /// Incremental text of the reply.
    Content(String),
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub submission: String,
    pub task_id: String,
    pub subtask: SubtaskContext,
    pub step: Step,
    pub session_id: String,
}

/// Score and feedback for a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub passed: bool,
}

impl ValidationOutcome {
    /// A failed result carrying `feedback`, used for every error path.
    pub fn failure(feedback: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            feedback: feedback.into(),
            recommendations: Vec::new(),
            passed: false,
        }
    }
}

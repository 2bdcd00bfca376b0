//! Catalog domain model.
//!
//! Tasks, subtasks and steps as delivered by the catalog endpoint, kept in
//! ordinal order. Only a step's `is_completed` and `student_response` change
//! per learner; everything else is immutable catalog content.

use serde::{Deserialize, Serialize};

/// A single unit of work inside a subtask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    /// Ordinal inside the parent subtask.
    pub number: u32,
    /// Prompt text shown to the learner.
    pub step: String,
    pub objective: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub student_response: String,
    #[serde(default)]
    pub validation_criteria: Vec<String>,
    #[serde(default)]
    pub deliverables: Vec<String>,
    /// Role of the team member who leads the chat for this step.
    #[serde(default)]
    pub primary_agent: String,
}

/// An ordered group of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: String,
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A task in the learning catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub number: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

/// Completed/total step counts for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TaskProgress {
    pub completed: usize,
    pub total: usize,
}

impl TaskProgress {
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

impl Task {
    /// Iterates over `(subtask, step)` pairs in subtask-then-step order.
    pub fn steps_in_order(&self) -> impl Iterator<Item = (&Subtask, &Step)> {
        self.subtasks
            .iter()
            .flat_map(|subtask| subtask.steps.iter().map(move |step| (subtask, step)))
    }

    /// The first step in subtask-then-step order, if the task has any steps.
    /// Empty subtasks are passed over.
    pub fn first_position(&self) -> Option<(&Subtask, &Step)> {
        self.steps_in_order().next()
    }

    pub fn find_subtask(&self, subtask_id: &str) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == subtask_id)
    }

    /// Finds a step anywhere in the task together with its parent subtask.
    pub fn find_step(&self, step_id: &str) -> Option<(&Subtask, &Step)> {
        self.steps_in_order().find(|(_, step)| step.id == step_id)
    }

    pub fn find_step_mut(&mut self, step_id: &str) -> Option<&mut Step> {
        self.subtasks
            .iter_mut()
            .flat_map(|subtask| subtask.steps.iter_mut())
            .find(|step| step.id == step_id)
    }

    /// Resolves a `(subtask, step)` pair, requiring the step to belong to the subtask.
    pub fn resolve(&self, subtask_id: &str, step_id: &str) -> Option<(&Subtask, &Step)> {
        let subtask = self.find_subtask(subtask_id)?;
        let step = subtask.steps.iter().find(|s| s.id == step_id)?;
        Some((subtask, step))
    }

    pub fn progress(&self) -> TaskProgress {
        self.steps_in_order()
            .fold(TaskProgress::default(), |mut acc, (_, step)| {
                acc.total += 1;
                if step.is_completed {
                    acc.completed += 1;
                }
                acc
            })
    }
}

/// A member of the AI team a learner chats with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub name: String,
    /// Matched against `Step::primary_agent`.
    pub role: String,
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Finds the team member acting in `role` (case-insensitive).
pub fn team_member_for_role<'a>(members: &'a [TeamMember], role: &str) -> Option<&'a TeamMember> {
    members
        .iter()
        .find(|member| member.role.eq_ignore_ascii_case(role))
}

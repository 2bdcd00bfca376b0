//! The learner's current selection.

use serde::Serialize;

/// Which parts of the (task, subtask, step) triple are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SelectionState {
    /// No task loaded.
    Empty,
    TaskOnly,
    TaskSubtask,
    /// Task, subtask and step set, with the step inside the subtask inside the task.
    Full,
}

/// Selected ids. Values are resolved against the task list on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub task_id: Option<String>,
    pub subtask_id: Option<String>,
    pub step_id: Option<String>,
}

impl Selection {
    pub fn task(task_id: impl Into<String>) -> Self {
        Self {
            task_id: Some(task_id.into()),
            subtask_id: None,
            step_id: None,
        }
    }

    pub fn full(
        task_id: impl Into<String>,
        subtask_id: impl Into<String>,
        step_id: impl Into<String>,
    ) -> Self {
        Self {
            task_id: Some(task_id.into()),
            subtask_id: Some(subtask_id.into()),
            step_id: Some(step_id.into()),
        }
    }

    pub fn state(&self) -> SelectionState {
        match (&self.task_id, &self.subtask_id, &self.step_id) {
            (None, _, _) => SelectionState::Empty,
            (Some(_), None, _) => SelectionState::TaskOnly,
            (Some(_), Some(_), None) => SelectionState::TaskSubtask,
            (Some(_), Some(_), Some(_)) => SelectionState::Full,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_follows_set_fields() {
        assert_eq!(Selection::default().state(), SelectionState::Empty);
        assert_eq!(Selection::task("t").state(), SelectionState::TaskOnly);
        let mut sel = Selection::task("t");
        sel.subtask_id = Some("s".into());
        assert_eq!(sel.state(), SelectionState::TaskSubtask);
        assert_eq!(Selection::full("t", "s", "p").state(), SelectionState::Full);
    }
}

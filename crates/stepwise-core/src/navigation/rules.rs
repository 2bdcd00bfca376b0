//! Unlock and successor rules over the catalog.
//!
//! Pure functions; the navigation engine applies them to its owned state.

use crate::catalog::{Step, Subtask, Task};

/// The step the learner is working towards: the first incomplete step in
/// subtask-then-step order, or the last step when everything is complete.
pub fn furthest_progress(task: &Task) -> Option<(&Subtask, &Step)> {
    task.steps_in_order()
        .find(|(_, step)| !step.is_completed)
        .or_else(|| task.steps_in_order().last())
}

/// Whether the learner may open `step_id` in `task`.
///
/// A step is accessible when it is completed, when it is the very first step
/// of the task, or when it is the furthest-progress step.
pub fn is_step_accessible(task: &Task, step_id: &str) -> bool {
    let Some((_, step)) = task.find_step(step_id) else {
        return false;
    };
    if step.is_completed {
        return true;
    }
    if matches!(task.first_position(), Some((_, first)) if first.id == step_id) {
        return true;
    }
    matches!(furthest_progress(task), Some((_, furthest)) if furthest.id == step_id)
}

/// A resolved successor position.
#[derive(Debug, Clone, Copy)]
pub struct Successor<'a> {
    pub task: &'a Task,
    pub subtask: &'a Subtask,
    pub step: &'a Step,
}

fn first_step(task: &Task) -> Option<Successor<'_>> {
    task.first_position().map(|(subtask, step)| Successor {
        task,
        subtask,
        step,
    })
}

/// Successor inside the same task: the next step of the subtask, else the
/// first step of the next non-empty subtask.
///
/// Walks the ordered vectors by position, matching `furthest_progress`.
fn next_within_task<'a>(task: &'a Task, subtask_id: &str, step_id: &str) -> Option<Successor<'a>> {
    let subtask_index = task.subtasks.iter().position(|s| s.id == subtask_id)?;
    let subtask = &task.subtasks[subtask_index];
    let step_index = subtask.steps.iter().position(|s| s.id == step_id)?;

    if let Some(next_step) = subtask.steps.get(step_index + 1) {
        return Some(Successor {
            task,
            subtask,
            step: next_step,
        });
    }

    task.subtasks[subtask_index + 1..].iter().find_map(|next_subtask| {
        next_subtask.steps.first().map(|next_step| Successor {
            task,
            subtask: next_subtask,
            step: next_step,
        })
    })
}

/// Deterministic successor of the current position.
///
/// In order of preference:
/// 1. next step in the current subtask
/// 2. first step of the next subtask in the current task
/// 3. from the home task, the first step of the first non-home task
/// 4. first step of the next task in catalog order
///
/// Tasks without steps are passed over. Returns `None` at the end of the catalog.
pub fn successor<'a>(
    tasks: &'a [Task],
    task_id: &str,
    subtask_id: &str,
    step_id: &str,
    home_task_id: Option<&str>,
) -> Option<Successor<'a>> {
    let index = tasks.iter().position(|task| task.id == task_id)?;
    let current = &tasks[index];

    if let Some(next) = next_within_task(current, subtask_id, step_id) {
        return Some(next);
    }

    if home_task_id == Some(current.id.as_str()) {
        return tasks
            .iter()
            .filter(|task| Some(task.id.as_str()) != home_task_id)
            .find_map(first_step);
    }

    tasks[index + 1..].iter().find_map(first_step)
}

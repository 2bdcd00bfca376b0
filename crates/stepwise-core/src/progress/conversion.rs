//! Conversion between the ordered in-memory `Task` and the keyed `ProgressDocument`.

use super::document::{CurrentPosition, ProgressDocument, StepProgress, SubtaskProgress};
use crate::catalog::{Step, Subtask, Task};
use chrono::Utc;

/// Seeds a fresh progress document from catalog content.
///
/// Every step starts incomplete with an empty response and zero chat count.
/// The position points at the first step of the first subtask, or is empty
/// when the task has no steps.
pub fn to_persisted(task: &Task) -> ProgressDocument {
    let now = Utc::now();

    let subtasks = task
        .subtasks
        .iter()
        .map(|subtask| {
            let steps = subtask
                .steps
                .iter()
                .map(|step| (step.id.clone(), seed_step(step)))
                .collect();
            let entry = SubtaskProgress {
                id: subtask.id.clone(),
                number: subtask.number,
                name: subtask.name.clone(),
                description: subtask.description.clone(),
                steps,
            };
            (subtask.id.clone(), entry)
        })
        .collect();

    let (subtask_id, step_id) = match task.first_position() {
        Some((subtask, step)) => (Some(subtask.id.clone()), Some(step.id.clone())),
        None => (None, None),
    };

    ProgressDocument {
        task_id: task.id.clone(),
        task_name: task.name.clone(),
        task_number: task.number,
        description: task.description.clone(),
        phase: task.phase.clone(),
        objective: task.objective.clone(),
        subtasks,
        current_position: CurrentPosition {
            subtask_id,
            step_id,
            last_active_at: now,
        },
        created_at: now,
        updated_at: now,
    }
}

fn seed_step(step: &Step) -> StepProgress {
    StepProgress {
        id: step.id.clone(),
        number: step.number,
        step: step.step.clone(),
        objective: step.objective.clone(),
        is_completed: false,
        student_response: String::new(),
        validation_criteria: step.validation_criteria.clone(),
        deliverables: step.deliverables.clone(),
        primary_agent: step.primary_agent.clone(),
        chat_count: 0,
        last_chat_at: None,
    }
}

/// Rebuilds the ordered task from a persisted document.
///
/// Subtasks and steps are sorted by their stored ordinal. Duplicate ordinals
/// are logged and tolerated; ties are ordered by id.
pub fn from_persisted(doc: &ProgressDocument) -> Task {
    let mut subtasks: Vec<Subtask> = doc
        .subtasks
        .values()
        .map(|subtask| {
            let mut steps: Vec<Step> = subtask
                .steps
                .values()
                .map(|step| Step {
                    id: step.id.clone(),
                    number: step.number,
                    step: step.step.clone(),
                    objective: step.objective.clone(),
                    is_completed: step.is_completed,
                    student_response: step.student_response.clone(),
                    validation_criteria: step.validation_criteria.clone(),
                    deliverables: step.deliverables.clone(),
                    primary_agent: step.primary_agent.clone(),
                })
                .collect();
            steps.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
            warn_on_duplicate_ordinals("step", &subtask.id, steps.iter().map(|s| s.number));

            Subtask {
                id: subtask.id.clone(),
                number: subtask.number,
                name: subtask.name.clone(),
                description: subtask.description.clone(),
                steps,
            }
        })
        .collect();
    subtasks.sort_by(|a, b| a.number.cmp(&b.number).then_with(|| a.id.cmp(&b.id)));
    warn_on_duplicate_ordinals("subtask", &doc.task_id, subtasks.iter().map(|s| s.number));

    Task {
        id: doc.task_id.clone(),
        name: doc.task_name.clone(),
        number: doc.task_number,
        description: doc.description.clone(),
        phase: doc.phase.clone(),
        objective: doc.objective.clone(),
        subtasks,
    }
}

fn warn_on_duplicate_ordinals(kind: &str, parent_id: &str, sorted: impl Iterator<Item = u32>) {
    let mut previous = None;
    for number in sorted {
        if previous == Some(number) {
            tracing::warn!(
                "[ProgressConversion] duplicate {} ordinal {} under '{}'; ordering by id",
                kind,
                number,
                parent_id
            );
        }
        previous = Some(number);
    }
}

/// Copies per-learner step state from `doc` onto the catalog task, matching by id.
///
/// Steps missing from the document keep their catalog state. Returns the
/// number of steps that were updated.
pub fn apply_progress(task: &mut Task, doc: &ProgressDocument) -> usize {
    let mut applied = 0;
    for subtask in &mut task.subtasks {
        let Some(persisted) = doc.subtasks.get(&subtask.id) else {
            continue;
        };
        for step in &mut subtask.steps {
            if let Some(saved) = persisted.steps.get(&step.id) {
                step.is_completed = saved.is_completed;
                step.student_response = saved.student_response.clone();
                applied += 1;
            }
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{intro, step, subtask, task};

    fn multi() -> Task {
        task(
            "T",
            3,
            vec![
                subtask("S1", 1, vec![step("A", 1), step("B", 2), step("C", 3)]),
                subtask("S2", 2, vec![step("D", 1)]),
                subtask("S3", 3, vec![step("E", 1), step("F", 2)]),
            ],
        )
    }

    #[test]
    fn test_round_trip_preserves_order() {
        let original = multi();
        let restored = from_persisted(&to_persisted(&original));
        assert_eq!(restored, original);
    }

    #[test]
    fn test_seed_resets_learner_state() {
        let mut original = intro();
        original.find_step_mut("A").unwrap().is_completed = true;
        original.find_step_mut("A").unwrap().student_response = "done".into();

        let doc = to_persisted(&original);
        let a = doc.step("S1", "A").unwrap();
        assert!(!a.is_completed);
        assert!(a.student_response.is_empty());
        assert_eq!(a.chat_count, 0);
        assert!(a.last_chat_at.is_none());
    }

    #[test]
    fn test_seed_points_at_first_step() {
        let doc = to_persisted(&multi());
        assert_eq!(doc.current_position.ids(), Some(("S1", "A")));
        assert!(doc.position_is_consistent());
    }

    #[test]
    fn test_seed_without_steps_has_empty_position() {
        let empty = task("Empty", 1, vec![subtask("S1", 1, vec![])]);
        let doc = to_persisted(&empty);
        assert_eq!(doc.current_position.ids(), None);
        assert!(doc.position_is_consistent());
    }

    #[test]
    fn test_from_persisted_sorts_by_number_not_insertion() {
        // Catalog listed out of ordinal order
        let scrambled = task(
            "T",
            1,
            vec![
                subtask("S2", 2, vec![step("D", 2), step("C", 1)]),
                subtask("S1", 1, vec![step("A", 1)]),
            ],
        );
        let restored = from_persisted(&to_persisted(&scrambled));
        let order: Vec<_> = restored.steps_in_order().map(|(_, s)| s.id.clone()).collect();
        assert_eq!(order, vec!["A", "C", "D"]);
    }

    #[test]
    fn test_duplicate_ordinals_are_tolerated() {
        let dup = task("T", 1, vec![subtask("S1", 1, vec![step("A", 1), step("B", 1)])]);
        let restored = from_persisted(&to_persisted(&dup));
        assert_eq!(restored.subtasks[0].steps.len(), 2);
    }

    #[test]
    fn test_duplicate_ordinals_are_ordered_by_id() {
        let dup = task(
            "T",
            1,
            vec![
                subtask("Y", 1, vec![step("b", 1), step("c", 1), step("a", 1)]),
                subtask("X", 1, vec![step("d", 1)]),
            ],
        );
        let doc = to_persisted(&dup);

        for _ in 0..5 {
            let restored = from_persisted(&doc);
            let subtasks: Vec<_> = restored.subtasks.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(subtasks, vec!["X", "Y"]);
            let steps: Vec<_> = restored.subtasks[1].steps.iter().map(|s| s.id.as_str()).collect();
            assert_eq!(steps, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_seed_skips_leading_empty_subtask() {
        let t = task(
            "T",
            1,
            vec![subtask("S0", 1, vec![]), subtask("S1", 2, vec![step("A", 1)])],
        );
        let doc = to_persisted(&t);
        assert_eq!(doc.current_position.ids(), Some(("S1", "A")));
        assert!(doc.position_is_consistent());
    }

    #[test]
    fn test_apply_progress_matches_by_id() {
        let mut doc = to_persisted(&intro());
        let b = doc
            .subtasks
            .get_mut("S1")
            .and_then(|s| s.steps.get_mut("B"))
            .unwrap();
        b.is_completed = true;
        b.student_response = "answer".into();

        let mut catalog = intro();
        let applied = apply_progress(&mut catalog, &doc);

        assert_eq!(applied, 2);
        let (_, b) = catalog.find_step("B").unwrap();
        assert!(b.is_completed);
        assert_eq!(b.student_response, "answer");
        assert!(!catalog.find_step("A").unwrap().1.is_completed);
    }
}

use std::sync::Arc;
use stepwise_core::auth::AuthProvider;
use stepwise_core::catalog::{CatalogSource, Step, Subtask, Task, TaskProgress, TeamMember};
use stepwise_core::error::Result;
use stepwise_core::location::StepLocation;
use stepwise_core::navigation::{Selection, SelectionState, is_step_accessible, successor};
use stepwise_core::progress::{ProgressRepository, apply_progress};
use tokio::sync::{Mutex, RwLock};

/// Cloned view of a fully selected position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStep {
    pub task_id: String,
    pub task_name: String,
    pub subtask: Subtask,
    pub step: Step,
}

impl ActiveStep {
    pub fn location(&self) -> StepLocation {
        StepLocation::new(&self.task_id, &self.subtask.id, &self.step.id)
    }
}

#[derive(Debug, Default)]
struct EngineState {
    tasks: Vec<Task>,
    team_members: Vec<TeamMember>,
    selection: Selection,
    catalog_error: Option<String>,
    is_loading: bool,
}

impl EngineState {
    fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    fn task_mut(&mut self, task_id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }

    fn current_task(&self) -> Option<&Task> {
        self.selection
            .task_id
            .as_deref()
            .and_then(|task_id| self.task(task_id))
    }

    fn active_step(&self) -> Option<ActiveStep> {
        let task = self.current_task()?;
        let (subtask, step) = task.resolve(
            self.selection.subtask_id.as_deref()?,
            self.selection.step_id.as_deref()?,
        )?;
        Some(ActiveStep {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            subtask: subtask.clone(),
            step: step.clone(),
        })
    }
}

/// The single owned store for the catalog, the learner's progress and the
/// current (task, subtask, step) selection.
///
/// Remote progress is best effort: gateway failures are logged and the
/// in-memory state stays authoritative for the rest of the session. Without a
/// signed-in user no gateway calls are made at all.
pub struct NavigationEngine {
    catalog: Arc<dyn CatalogSource>,
    progress: Arc<dyn ProgressRepository>,
    auth: Arc<dyn AuthProvider>,
    home_task_id: Option<String>,
    state: RwLock<EngineState>,
    /// Serializes mutating operations; readers only take `state`.
    ops: Mutex<()>,
}

impl NavigationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        progress: Arc<dyn ProgressRepository>,
        auth: Arc<dyn AuthProvider>,
        home_task_id: Option<String>,
    ) -> Self {
        Self {
            catalog,
            progress,
            auth,
            home_task_id,
            state: RwLock::new(EngineState::default()),
            ops: Mutex::new(()),
        }
    }

    /// Loads the catalog and selects the first task.
    ///
    /// A failure is kept as a sticky error (see [`Self::catalog_error`]) and
    /// leaves the selection empty. Team members are optional.
    ///
    /// # Returns
    ///
    /// The number of tasks loaded.
    pub async fn load_catalog(&self) -> Result<usize> {
        let _ops = self.ops.lock().await;
        self.state.write().await.is_loading = true;

        let tasks = match self.catalog.fetch_tasks().await {
            Ok(tasks) => tasks,
            Err(err) => {
                tracing::error!("[NavigationEngine] Failed to load task catalog: {}", err);
                let mut state = self.state.write().await;
                state.tasks.clear();
                state.selection = Selection::default();
                state.catalog_error = Some(err.user_message());
                state.is_loading = false;
                return Err(err);
            }
        };

        let team_members = self
            .catalog
            .fetch_team_members()
            .await
            .unwrap_or_else(|err| {
                tracing::warn!("[NavigationEngine] Failed to load team members: {}", err);
                Vec::new()
            });

        let count = tasks.len();
        let first_task_id = tasks.first().map(|task| task.id.clone());
        {
            let mut state = self.state.write().await;
            state.tasks = tasks;
            state.team_members = team_members;
            state.catalog_error = None;
            state.selection = Selection::default();
        }
        tracing::info!("[NavigationEngine] Loaded {} tasks", count);

        if let Some(task_id) = first_task_id {
            self.select_task_inner(&task_id).await;
        }

        self.state.write().await.is_loading = false;
        Ok(count)
    }

    /// Selects a task and resumes the learner's saved position in it.
    ///
    /// A saved position that resolves is restored without writing anything.
    /// Otherwise the first step is selected and written back.
    ///
    /// Returns `false` for an unknown task.
    pub async fn select_task(&self, task_id: &str) -> bool {
        let _ops = self.ops.lock().await;
        self.select_task_inner(task_id).await
    }

    async fn select_task_inner(&self, task_id: &str) -> bool {
        let task = {
            let mut state = self.state.write().await;
            let Some(task) = state.task(task_id).cloned() else {
                tracing::warn!("[NavigationEngine] Unknown task: {}", task_id);
                return false;
            };
            state.selection = Selection::task(task_id);
            task
        };

        let Some(user_id) = self.auth.user_id() else {
            self.commit_first_position(task_id).await;
            return true;
        };

        match self.progress.fetch(&user_id, task_id).await {
            Ok(Some(doc)) => {
                let resumed = {
                    let mut state = self.state.write().await;
                    let resumed = state.task_mut(task_id).and_then(|task| {
                        let merged = apply_progress(task, &doc);
                        tracing::debug!(
                            "[NavigationEngine] Merged progress for {} steps of task {}",
                            merged,
                            task_id
                        );
                        let (subtask_id, step_id) = doc.current_position.ids()?;
                        task.resolve(subtask_id, step_id)
                            .map(|(subtask, step)| Selection::full(task_id, &subtask.id, &step.id))
                    });
                    match resumed {
                        Some(selection) => {
                            state.selection = selection;
                            true
                        }
                        None => false,
                    }
                };

                if resumed {
                    tracing::info!("[NavigationEngine] Resumed saved position in task {}", task_id);
                } else if let Some(location) = self.commit_first_position(task_id).await {
                    self.persist_position(&user_id, &location).await;
                }
            }
            Ok(None) => {
                self.commit_first_position(task_id).await;
                match self.progress.initialize(&user_id, &task).await {
                    Ok(_) => tracing::debug!("[NavigationEngine] Initialized progress for {}", task_id),
                    Err(err) => tracing::warn!(
                        "[NavigationEngine] Failed to initialize progress for {}: {}",
                        task_id,
                        err
                    ),
                }
            }
            Err(err) => {
                tracing::warn!(
                    "[NavigationEngine] Could not load progress for task {}, starting at the first step: {}",
                    task_id,
                    err
                );
                if let Some(location) = self.commit_first_position(task_id).await {
                    self.persist_fallback_position(&user_id, &task, &location).await;
                }
            }
        }
        true
    }

    /// Moves to the first accessible step of a subtask of the current task.
    pub async fn select_subtask(&self, subtask_id: &str) -> bool {
        let _ops = self.ops.lock().await;
        let mut state = self.state.write().await;
        let Some(task) = state.current_task() else {
            return false;
        };
        let Some(subtask) = task.find_subtask(subtask_id) else {
            return false;
        };
        let target = subtask
            .steps
            .iter()
            .find(|step| is_step_accessible(task, &step.id))
            .map(|step| Selection::full(&task.id, &subtask.id, &step.id));

        match target {
            Some(selection) => {
                state.selection = selection;
                true
            }
            None => {
                tracing::debug!("[NavigationEngine] Subtask {} is locked", subtask_id);
                false
            }
        }
    }

    /// Moves to a step of the current task if it is accessible.
    ///
    /// Nothing is persisted; a rejected step leaves the selection unchanged.
    pub async fn select_step(&self, step_id: &str) -> bool {
        let _ops = self.ops.lock().await;
        let mut state = self.state.write().await;
        let Some(task) = state.current_task() else {
            return false;
        };
        if !is_step_accessible(task, step_id) {
            tracing::debug!("[NavigationEngine] Step {} is locked", step_id);
            return false;
        }
        let Some((subtask, step)) = task.find_step(step_id) else {
            return false;
        };
        let selection = Selection::full(&task.id, &subtask.id, &step.id);
        state.selection = selection;
        true
    }

    /// Marks a step of the current task completed with the learner's response.
    ///
    /// Applied in memory first, then written to the gateway. Re-applying the
    /// same arguments is harmless.
    pub async fn complete_step(&self, step_id: &str, response: &str) -> bool {
        let Some(task_id) = self.state.read().await.selection.task_id.clone() else {
            return false;
        };
        self.complete_step_in(&task_id, step_id, response).await
    }

    /// Marks a step of `task_id` completed, whether or not that task is
    /// still selected.
    pub async fn complete_step_in(&self, task_id: &str, step_id: &str, response: &str) -> bool {
        let _ops = self.ops.lock().await;
        let location = {
            let mut state = self.state.write().await;
            let Some(task) = state.task_mut(task_id) else {
                tracing::warn!("[NavigationEngine] Cannot complete step in unknown task {}", task_id);
                return false;
            };
            let Some(subtask_id) = task.find_step(step_id).map(|(subtask, _)| subtask.id.clone())
            else {
                tracing::warn!("[NavigationEngine] Cannot complete unknown step {}", step_id);
                return false;
            };
            if let Some(step) = task.find_step_mut(step_id) {
                step.is_completed = true;
                step.student_response = response.to_string();
            }
            StepLocation::new(task_id, subtask_id, step_id)
        };
        tracing::info!("[NavigationEngine] Completed step {}", location);

        if let Some(user_id) = self.auth.user_id() {
            if let Err(err) = self
                .progress
                .update_step_completion(&user_id, &location, true, Some(response))
                .await
            {
                tracing::warn!(
                    "[NavigationEngine] Failed to persist completion of {}: {}",
                    location,
                    err
                );
            }
        }
        true
    }

    /// Advances to the successor position.
    ///
    /// The new position is written before the selection changes. Entering
    /// another task first makes sure its progress document exists. Returns
    /// `false` when there is no successor.
    pub async fn navigate_to_next(&self) -> bool {
        let _ops = self.ops.lock().await;
        let (target, entered_task) = {
            let state = self.state.read().await;
            let selection = &state.selection;
            let (Some(task_id), Some(subtask_id), Some(step_id)) = (
                selection.task_id.as_deref(),
                selection.subtask_id.as_deref(),
                selection.step_id.as_deref(),
            ) else {
                return false;
            };
            let Some(next) = successor(
                &state.tasks,
                task_id,
                subtask_id,
                step_id,
                self.home_task_id.as_deref(),
            ) else {
                tracing::debug!("[NavigationEngine] No successor after {}/{}/{}", task_id, subtask_id, step_id);
                return false;
            };
            let target = StepLocation::new(&next.task.id, &next.subtask.id, &next.step.id);
            let entered_task = (next.task.id != task_id).then(|| next.task.clone());
            (target, entered_task)
        };

        if let Some(user_id) = self.auth.user_id() {
            if let Some(task) = &entered_task {
                self.ensure_progress(&user_id, task).await;
            }
            self.persist_position(&user_id, &target).await;
        }

        self.state.write().await.selection =
            Selection::full(&target.task_id, &target.subtask_id, &target.step_id);
        tracing::info!("[NavigationEngine] Moved to {}", target);
        true
    }

    async fn commit_first_position(&self, task_id: &str) -> Option<StepLocation> {
        let mut state = self.state.write().await;
        let task = state.task(task_id)?;
        let first = task
            .first_position()
            .map(|(subtask, step)| StepLocation::new(&task.id, &subtask.id, &step.id));
        let first_subtask_id = task.subtasks.first().map(|subtask| subtask.id.clone());

        match &first {
            Some(location) => {
                state.selection =
                    Selection::full(&location.task_id, &location.subtask_id, &location.step_id);
            }
            None => {
                state.selection = Selection::task(task_id);
                state.selection.subtask_id = first_subtask_id;
            }
        }
        first
    }

    async fn persist_position(&self, user_id: &str, location: &StepLocation) {
        match self.progress.update_position(user_id, location).await {
            Ok(()) => tracing::debug!("[NavigationEngine] Saved position {}", location),
            Err(err) => tracing::warn!(
                "[NavigationEngine] Failed to save position {}: {}",
                location,
                err
            ),
        }
    }

    /// Position write when the document state is unknown: create it seeded at
    /// the first step, or update the position of the existing one.
    async fn persist_fallback_position(&self, user_id: &str, task: &Task, location: &StepLocation) {
        match self.progress.initialize(user_id, task).await {
            Ok(_) => tracing::debug!("[NavigationEngine] Initialized progress for {}", task.id),
            Err(err) if err.is_already_exists() => self.persist_position(user_id, location).await,
            Err(err) => tracing::warn!(
                "[NavigationEngine] Failed to save fallback position {}: {}",
                location,
                err
            ),
        }
    }

    async fn ensure_progress(&self, user_id: &str, task: &Task) {
        match self.progress.fetch(user_id, &task.id).await {
            Ok(Some(doc)) => {
                let mut state = self.state.write().await;
                if let Some(task) = state.task_mut(&task.id) {
                    apply_progress(task, &doc);
                }
            }
            Ok(None) => {
                if let Err(err) = self.progress.initialize(user_id, task).await {
                    if !err.is_already_exists() {
                        tracing::warn!(
                            "[NavigationEngine] Failed to initialize progress for {}: {}",
                            task.id,
                            err
                        );
                    }
                }
            }
            Err(err) => tracing::warn!(
                "[NavigationEngine] Could not load progress for task {}: {}",
                task.id,
                err
            ),
        }
    }

    // ------------------------------------------------------------------
    // Read accessors
    // ------------------------------------------------------------------

    pub async fn tasks(&self) -> Vec<Task> {
        self.state.read().await.tasks.clone()
    }

    pub async fn task(&self, task_id: &str) -> Option<Task> {
        self.state.read().await.task(task_id).cloned()
    }

    pub async fn team_members(&self) -> Vec<TeamMember> {
        self.state.read().await.team_members.clone()
    }

    pub async fn selection(&self) -> Selection {
        self.state.read().await.selection.clone()
    }

    pub async fn selection_state(&self) -> SelectionState {
        self.state.read().await.selection.state()
    }

    /// The selected task, subtask and step, when all three are set.
    pub async fn current_step(&self) -> Option<ActiveStep> {
        self.state.read().await.active_step()
    }

    pub async fn catalog_error(&self) -> Option<String> {
        self.state.read().await.catalog_error.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn task_progress(&self, task_id: &str) -> Option<TaskProgress> {
        self.state.read().await.task(task_id).map(Task::progress)
    }

    /// Accessibility of a step in the current task.
    pub async fn is_step_accessible(&self, step_id: &str) -> bool {
        let state = self.state.read().await;
        state
            .current_task()
            .is_some_and(|task| is_step_accessible(task, step_id))
    }

    pub fn home_task_id(&self) -> Option<&str> {
        self.home_task_id.as_deref()
    }
}

//! DocumentStore-backed progress repository.

use crate::document_store::{DocumentPath, DocumentStore, FieldUpdate, load_document};
use async_trait::async_trait;
use std::sync::Arc;
use stepwise_core::StepLocation;
use stepwise_core::catalog::Task;
use stepwise_core::error::Result;
use stepwise_core::progress::{ProgressDocument, ProgressRepository, fields, to_persisted};

const COLLECTION: &str = "user_progress";
const TASKS: &str = "tasks";

/// Progress documents at `user_progress/{user_id}/tasks/{task_id}`.
pub struct DocumentProgressRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentProgressRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn document_path(user_id: &str, task_id: &str) -> Result<DocumentPath> {
        DocumentPath::new([COLLECTION, user_id, TASKS, task_id])
    }

    fn step_field(location: &StepLocation, field: &str) -> [String; 5] {
        [
            fields::SUBTASKS.to_string(),
            location.subtask_id.clone(),
            fields::STEPS.to_string(),
            location.step_id.clone(),
            field.to_string(),
        ]
    }
}

#[async_trait]
impl ProgressRepository for DocumentProgressRepository {
    async fn fetch(&self, user_id: &str, task_id: &str) -> Result<Option<ProgressDocument>> {
        let path = Self::document_path(user_id, task_id)?;
        load_document(self.store.as_ref(), &path).await
    }

    async fn initialize(&self, user_id: &str, task: &Task) -> Result<ProgressDocument> {
        let path = Self::document_path(user_id, &task.id)?;
        let document = to_persisted(task);
        self.store
            .create(&path, serde_json::to_value(&document)?)
            .await?;
        tracing::info!("[ProgressRepository] Initialized progress at {}", path);
        Ok(document)
    }

    async fn update_position(&self, user_id: &str, location: &StepLocation) -> Result<()> {
        let path = Self::document_path(user_id, &location.task_id)?;
        let updates = [
            FieldUpdate::set(
                &[fields::CURRENT_POSITION, fields::SUBTASK_ID],
                location.subtask_id.clone(),
            ),
            FieldUpdate::set(
                &[fields::CURRENT_POSITION, fields::STEP_ID],
                location.step_id.clone(),
            ),
            FieldUpdate::server_timestamp(&[fields::CURRENT_POSITION, fields::LAST_ACTIVE_AT]),
            FieldUpdate::server_timestamp(&[fields::UPDATED_AT]),
        ];
        self.store.update(&path, &updates).await?;
        tracing::debug!("[ProgressRepository] Position of {} set to {}", user_id, location);
        Ok(())
    }

    async fn update_step_completion(
        &self,
        user_id: &str,
        location: &StepLocation,
        is_completed: bool,
        response: Option<&str>,
    ) -> Result<()> {
        let path = Self::document_path(user_id, &location.task_id)?;
        let mut updates = vec![FieldUpdate::set(
            &Self::step_field(location, fields::IS_COMPLETED),
            is_completed,
        )];
        if let Some(response) = response {
            updates.push(FieldUpdate::set(
                &Self::step_field(location, fields::STUDENT_RESPONSE),
                response,
            ));
        }
        updates.push(FieldUpdate::server_timestamp(&[fields::UPDATED_AT]));

        self.store.update(&path, &updates).await?;
        tracing::debug!(
            "[ProgressRepository] Step {} completion={} for {}",
            location,
            is_completed,
            user_id
        );
        Ok(())
    }

    async fn record_chat_activity(&self, user_id: &str, location: &StepLocation) -> Result<()> {
        let path = Self::document_path(user_id, &location.task_id)?;
        let updates = [
            FieldUpdate::increment(&Self::step_field(location, fields::CHAT_COUNT), 1),
            FieldUpdate::server_timestamp(&Self::step_field(location, fields::LAST_CHAT_AT)),
            FieldUpdate::server_timestamp(&[fields::UPDATED_AT]),
        ];
        self.store.update(&path, &updates).await
    }
}

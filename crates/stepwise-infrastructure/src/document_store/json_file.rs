//! JSON-file backed document store.

use super::{DocumentPath, DocumentStore, FieldUpdate, apply_updates};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::path::{Path, PathBuf};
use stepwise_core::error::{Result, StepwiseError};
use tokio::sync::Mutex;

/// Stores each document as a JSON file below a base directory.
///
/// Directory structure:
/// ```text
/// base_dir/
/// ├── user_progress/{user_id}/tasks/{task_id}.json
/// └── chat_messages/{user_id}/step_chats/{task}_{subtask}_{step}.json
/// ```
///
/// Writes go to a temporary file that is renamed over the target, and all
/// writes through one store are serialized, so a read-modify-write `update`
/// never interleaves with another writer.
pub struct JsonFileDocumentStore {
    base_dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileDocumentStore {
    /// Creates a store rooted at `base_dir`, creating the directory if needed.
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        tokio::fs::create_dir_all(&base_dir).await.map_err(|e| {
            StepwiseError::io(format!(
                "Failed to create document directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        Ok(Self {
            base_dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, path: &DocumentPath) -> PathBuf {
        let mut file = self.base_dir.clone();
        let segments = path.segments();
        for segment in &segments[..segments.len() - 1] {
            file.push(segment);
        }
        file.push(format!("{}.json", segments[segments.len() - 1]));
        file
    }

    async fn read(&self, file: &Path) -> Result<Option<Value>> {
        match tokio::fs::read_to_string(file).await {
            Ok(content) => {
                if content.trim().is_empty() {
                    return Ok(None);
                }
                Ok(Some(serde_json::from_str(&content)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_atomic(&self, file: &Path, document: &Value) -> Result<()> {
        if let Some(parent) = file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(document)?;
        let tmp = file.with_extension("json.tmp");
        tokio::fs::write(&tmp, content.as_bytes()).await?;
        tokio::fs::rename(&tmp, file).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for JsonFileDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>> {
        self.read(&self.file_path(path)).await
    }

    async fn create(&self, path: &DocumentPath, document: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let file = self.file_path(path);
        if self.read(&file).await?.is_some() {
            return Err(StepwiseError::already_exists("document", path.to_string()));
        }
        self.write_atomic(&file, &document).await
    }

    async fn set(&self, path: &DocumentPath, document: Value) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.write_atomic(&self.file_path(path), &document).await
    }

    async fn update(&self, path: &DocumentPath, updates: &[FieldUpdate]) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let file = self.file_path(path);
        let mut document = self
            .read(&file)
            .await?
            .ok_or_else(|| StepwiseError::not_found("document", path.to_string()))?;
        apply_updates(&mut document, updates, Utc::now())?;
        self.write_atomic(&file, &document).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.file_path(path)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

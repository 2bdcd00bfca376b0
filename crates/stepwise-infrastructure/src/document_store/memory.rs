//! In-memory document store.

use super::{DocumentPath, DocumentStore, FieldUpdate, apply_updates};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use stepwise_core::error::{Result, StepwiseError};
use tokio::sync::RwLock;

/// Process-lifetime document store.
///
/// Each update runs under the write lock, so concurrent field updates on the
/// same document are serialized and none are lost.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>> {
        let documents = self.documents.read().await;
        Ok(documents.get(&path.to_string()).cloned())
    }

    async fn create(&self, path: &DocumentPath, document: Value) -> Result<()> {
        let mut documents = self.documents.write().await;
        let key = path.to_string();
        if documents.contains_key(&key) {
            return Err(StepwiseError::already_exists("document", key));
        }
        documents.insert(key, document);
        Ok(())
    }

    async fn set(&self, path: &DocumentPath, document: Value) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.insert(path.to_string(), document);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, updates: &[FieldUpdate]) -> Result<()> {
        let mut documents = self.documents.write().await;
        let key = path.to_string();
        let current = documents
            .get(&key)
            .ok_or_else(|| StepwiseError::not_found("document", key.clone()))?;

        let mut next = current.clone();
        apply_updates(&mut next, updates, Utc::now())?;
        documents.insert(key, next);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<()> {
        let mut documents = self.documents.write().await;
        documents.remove(&path.to_string());
        Ok(())
    }
}

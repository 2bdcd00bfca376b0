//! DocumentStore-backed chat transcript repository.

use crate::document_store::{DocumentPath, DocumentStore, FieldUpdate, load_document};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use stepwise_core::error::Result;
use stepwise_core::transcript::{
    ChatMessage, Transcript, TranscriptKey, TranscriptRepository, TranscriptSummary, welcome_text,
};

const COLLECTION: &str = "chat_messages";
const STEP_CHATS: &str = "step_chats";

/// Transcripts at `chat_messages/{user_id}/step_chats/{task}_{subtask}_{step}`.
///
/// Appends after the first use the store's additive array-union and
/// increment updates, never a whole-array rewrite.
pub struct DocumentTranscriptRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentTranscriptRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn document_path(key: &TranscriptKey) -> Result<DocumentPath> {
        DocumentPath::new([
            COLLECTION,
            key.user_id.as_str(),
            STEP_CHATS,
            key.chat_id().as_str(),
        ])
    }

    async fn load(&self, key: &TranscriptKey) -> Result<Option<Transcript>> {
        let path = Self::document_path(key)?;
        load_document(self.store.as_ref(), &path).await
    }

    async fn append_existing(&self, path: &DocumentPath, message: &ChatMessage) -> Result<()> {
        let updates = [
            FieldUpdate::array_union(&["messages"], vec![serde_json::to_value(message)?]),
            FieldUpdate::increment(&["messageCount"], 1),
            FieldUpdate::server_timestamp(&["lastUpdated"]),
        ];
        self.store.update(path, &updates).await
    }
}

#[async_trait]
impl TranscriptRepository for DocumentTranscriptRepository {
    async fn get_messages(&self, key: &TranscriptKey) -> Result<Vec<ChatMessage>> {
        Ok(self
            .load(key)
            .await?
            .map(|transcript| transcript.messages)
            .unwrap_or_default())
    }

    async fn append_message(&self, key: &TranscriptKey, message: &ChatMessage) -> Result<()> {
        message.validate()?;
        let path = Self::document_path(key)?;

        if self.store.get(&path).await?.is_some() {
            return self.append_existing(&path, message).await;
        }

        let now = Utc::now();
        let transcript = Transcript {
            task_id: key.location.task_id.clone(),
            subtask_id: key.location.subtask_id.clone(),
            step_id: key.location.step_id.clone(),
            messages: vec![message.clone()],
            message_count: 1,
            created_at: now,
            last_updated: now,
        };
        match self
            .store
            .create(&path, serde_json::to_value(&transcript)?)
            .await
        {
            Ok(()) => {
                tracing::debug!("[TranscriptRepository] Created transcript {}", path);
                Ok(())
            }
            // Another writer created it first; fall back to the additive path.
            Err(e) if e.is_already_exists() => self.append_existing(&path, message).await,
            Err(e) => Err(e),
        }
    }

    async fn create_welcome_message(
        &self,
        key: &TranscriptKey,
        task_name: &str,
        step_objective: &str,
    ) -> Result<ChatMessage> {
        let message = ChatMessage::assistant(welcome_text(task_name, step_objective), None);
        self.append_message(key, &message).await?;
        Ok(message)
    }

    async fn get_summary(&self, key: &TranscriptKey) -> Result<Option<TranscriptSummary>> {
        Ok(self.load(key).await?.map(|transcript| transcript.summary()))
    }

    async fn reset(&self, key: &TranscriptKey) -> Result<()> {
        let path = Self::document_path(key)?;
        if self.store.get(&path).await?.is_none() {
            return Ok(());
        }
        let updates = [
            FieldUpdate::set(&["messages"], serde_json::Value::Array(Vec::new())),
            FieldUpdate::set(&["messageCount"], 0),
            FieldUpdate::server_timestamp(&["lastUpdated"]),
        ];
        self.store.update(&path, &updates).await?;
        tracing::info!("[TranscriptRepository] Reset transcript {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_store::InMemoryDocumentStore;
    use stepwise_core::StepLocation;
    use stepwise_core::error::StepwiseError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stepwise_core::transcript::MessageRole;

    fn key() -> TranscriptKey {
        TranscriptKey::new("u1", StepLocation::new("Intro", "S1", "A"))
    }

    fn create_test_repository() -> DocumentTranscriptRepository {
        DocumentTranscriptRepository::new(Arc::new(InMemoryDocumentStore::new()))
    }

    /// Holds the first two reads at a barrier so both writers see a missing
    /// document before either creates it.
    struct RacingStore {
        inner: InMemoryDocumentStore,
        gate: tokio::sync::Barrier,
        gated_reads: AtomicUsize,
    }

    #[async_trait]
    impl DocumentStore for RacingStore {
        async fn get(&self, path: &DocumentPath) -> Result<Option<serde_json::Value>> {
            let snapshot = self.inner.get(path).await;
            if self.gated_reads.fetch_add(1, Ordering::SeqCst) < 2 {
                self.gate.wait().await;
            }
            snapshot
        }

        async fn create(&self, path: &DocumentPath, document: serde_json::Value) -> Result<()> {
            self.inner.create(path, document).await
        }

        async fn set(&self, path: &DocumentPath, document: serde_json::Value) -> Result<()> {
            self.inner.set(path, document).await
        }

        async fn update(&self, path: &DocumentPath, updates: &[FieldUpdate]) -> Result<()> {
            self.inner.update(path, updates).await
        }

        async fn delete(&self, path: &DocumentPath) -> Result<()> {
            self.inner.delete(path).await
        }
    }

    #[tokio::test]
    async fn test_missing_transcript_reads_empty() {
        let repo = create_test_repository();
        assert!(repo.get_messages(&key()).await.unwrap().is_empty());
        assert!(repo.get_summary(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_appends_keep_insertion_order() {
        let repo = create_test_repository();
        let m1 = ChatMessage::user("first");
        let m2 = ChatMessage::assistant("second", Some("mentor".into()));

        repo.append_message(&key(), &m1).await.unwrap();
        repo.append_message(&key(), &m2).await.unwrap();

        let messages = repo.get_messages(&key()).await.unwrap();
        assert_eq!(messages, vec![m1, m2]);
        assert_eq!(repo.get_summary(&key()).await.unwrap().unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_invalid_message_is_rejected() {
        let repo = create_test_repository();
        let mut message = ChatMessage::user("hello");
        message.content.clear();

        let err = repo.append_message(&key(), &message).await.unwrap_err();
        assert!(matches!(err, StepwiseError::InvalidMessage(_)));
        assert!(repo.get_summary(&key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_welcome_message_is_appended_as_assistant() {
        let repo = create_test_repository();
        let welcome = repo
            .create_welcome_message(&key(), "Intro", "Say hello")
            .await
            .unwrap();

        assert_eq!(welcome.role, MessageRole::Assistant);
        assert_eq!(welcome.content, welcome_text("Intro", "Say hello"));
        assert_eq!(repo.get_messages(&key()).await.unwrap(), vec![welcome]);
    }

    #[tokio::test]
    async fn test_transcripts_are_keyed_per_step() {
        let repo = create_test_repository();
        let other = TranscriptKey::new("u1", StepLocation::new("Intro", "S1", "B"));

        repo.append_message(&key(), &ChatMessage::user("on A")).await.unwrap();
        assert!(repo.get_messages(&other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_empties_transcript() {
        let repo = create_test_repository();
        repo.append_message(&key(), &ChatMessage::user("hi")).await.unwrap();

        repo.reset(&key()).await.unwrap();

        assert!(repo.get_messages(&key()).await.unwrap().is_empty());
        assert_eq!(repo.get_summary(&key()).await.unwrap().unwrap().count, 0);
        // Resetting a missing transcript is a no-op
        let other = TranscriptKey::new("u2", StepLocation::new("Intro", "S1", "A"));
        repo.reset(&other).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_first_appends_are_both_kept() {
        let store = Arc::new(RacingStore {
            inner: InMemoryDocumentStore::new(),
            gate: tokio::sync::Barrier::new(2),
            gated_reads: AtomicUsize::new(0),
        });
        let repo = DocumentTranscriptRepository::new(store);
        let m1 = ChatMessage::user("from the laptop");
        let m2 = ChatMessage::user("from the phone");

        let (k1, k2) = (key(), key());
        let (r1, r2) = tokio::join!(
            repo.append_message(&k1, &m1),
            repo.append_message(&k2, &m2)
        );
        r1.unwrap();
        r2.unwrap();

        let messages = repo.get_messages(&key()).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.id == m1.id));
        assert!(messages.iter().any(|m| m.id == m2.id));
        assert_eq!(repo.get_summary(&key()).await.unwrap().unwrap().count, 2);
    }
}

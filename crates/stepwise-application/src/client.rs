//! Client assembly and explicit lifecycle.

use crate::chat::ChatSession;
use crate::connectivity::ConnectivityMonitor;
use crate::navigation::NavigationEngine;
use std::sync::Arc;
use std::time::Duration;
use stepwise_core::assistant::AssistantBackend;
use stepwise_core::auth::AuthProvider;
use stepwise_core::catalog::CatalogSource;
use stepwise_core::config::{ClientConfig, StorageConfig};
use stepwise_core::error::Result;
use stepwise_core::progress::ProgressRepository;
use stepwise_core::transcript::TranscriptRepository;
use stepwise_infrastructure::{
    DocumentProgressRepository, DocumentStore, DocumentTranscriptRepository,
    InMemoryDocumentStore, JsonFileDocumentStore, StaticAuthProvider, StepwisePaths,
};
use stepwise_interaction::{ApiClient, HttpAssistantBackend, HttpCatalogSource};

/// The collaborators a client is built from.
pub struct ClientComponents {
    pub catalog: Arc<dyn CatalogSource>,
    pub progress: Arc<dyn ProgressRepository>,
    pub transcripts: Arc<dyn TranscriptRepository>,
    pub backend: Arc<dyn AssistantBackend>,
    pub auth: Arc<dyn AuthProvider>,
}

/// Owns the navigation engine, the chat session and the background probe.
///
/// The host constructs it once, hands out the `Arc`s it needs and calls
/// [`StepwiseClient::shutdown`] when done.
pub struct StepwiseClient {
    config: ClientConfig,
    auth: Arc<dyn AuthProvider>,
    engine: Arc<NavigationEngine>,
    chat: Arc<ChatSession>,
    monitor: ConnectivityMonitor,
}

impl StepwiseClient {
    /// Builds the document store, repositories, HTTP clients and auth
    /// provider described by `config`.
    ///
    /// # Errors
    ///
    /// Fails when the file store directory cannot be resolved or created.
    pub async fn bootstrap(config: ClientConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match &config.storage {
            StorageConfig::Memory => Arc::new(InMemoryDocumentStore::new()),
            StorageConfig::File { data_dir } => {
                let data_dir = match data_dir {
                    Some(dir) => dir.clone(),
                    None => StepwisePaths::documents_dir()?,
                };
                tracing::info!("[Bootstrap] Storing progress under {}", data_dir.display());
                Arc::new(JsonFileDocumentStore::new(data_dir).await?)
            }
        };

        let api = ApiClient::new(config.api_base_url.clone());
        let auth = Arc::new(StaticAuthProvider::from_config(&config.auth));
        if !auth.is_signed_in() {
            tracing::info!("[Bootstrap] No user configured, progress stays in memory");
        }

        let components = ClientComponents {
            catalog: Arc::new(HttpCatalogSource::new(api.clone())),
            progress: Arc::new(DocumentProgressRepository::new(store.clone())),
            transcripts: Arc::new(DocumentTranscriptRepository::new(store)),
            backend: Arc::new(HttpAssistantBackend::new(api)),
            auth,
        };
        Ok(Self::from_components(config, components))
    }

    /// Wires a client from prepared collaborators.
    pub fn from_components(config: ClientConfig, components: ClientComponents) -> Self {
        let ClientComponents {
            catalog,
            progress,
            transcripts,
            backend,
            auth,
        } = components;

        let engine = Arc::new(NavigationEngine::new(
            catalog,
            progress.clone(),
            auth.clone(),
            config.home_task_id.clone(),
        ));
        let session_id = uuid::Uuid::new_v4().to_string();
        let chat = Arc::new(ChatSession::new(
            engine.clone(),
            transcripts,
            progress,
            backend.clone(),
            auth.clone(),
            session_id,
        ));

        let monitor = if config.probe_interval_secs == 0 {
            ConnectivityMonitor::disabled()
        } else {
            ConnectivityMonitor::start(backend, Duration::from_secs(config.probe_interval_secs))
        };

        tracing::info!("[Bootstrap] Client ready (api: {})", config.api_base_url);
        Self {
            config,
            auth,
            engine,
            chat,
            monitor,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn engine(&self) -> Arc<NavigationEngine> {
        self.engine.clone()
    }

    pub fn chat(&self) -> Arc<ChatSession> {
        self.chat.clone()
    }

    pub fn auth(&self) -> Arc<dyn AuthProvider> {
        self.auth.clone()
    }

    pub fn is_online(&self) -> bool {
        self.monitor.is_online()
    }

    /// Closes any streaming reply and stops the connectivity probe.
    pub async fn shutdown(&self) {
        if let Some(stream) = self.chat.cancel_handle().await {
            stream.cancel();
        }
        self.monitor.stop().await;
        tracing::info!("[Bootstrap] Client shut down");
    }
}

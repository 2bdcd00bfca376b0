//! Infrastructure layer for Stepwise: document storage, repositories,
//! payload normalization, configuration and paths.

pub mod auth;
pub mod config_service;
pub mod document_store;
pub mod dto;
pub mod paths;
pub mod progress_repository;
pub mod transcript_repository;

pub use crate::auth::StaticAuthProvider;
pub use crate::config_service::ConfigService;
pub use crate::document_store::{
    DocumentPath, DocumentStore, InMemoryDocumentStore, JsonFileDocumentStore,
};
pub use crate::paths::StepwisePaths;
pub use crate::progress_repository::DocumentProgressRepository;
pub use crate::transcript_repository::DocumentTranscriptRepository;

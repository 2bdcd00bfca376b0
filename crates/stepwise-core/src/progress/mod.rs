//! Progress domain module.
//!
//! # Module Structure
//!
//! - `document`: persisted `ProgressDocument` shape
//! - `conversion`: `to_persisted` / `from_persisted` / `apply_progress`
//! - `repository`: `ProgressRepository` trait

mod conversion;
mod document;
pub mod repository;

pub use conversion::{apply_progress, from_persisted, to_persisted};
pub use document::{CurrentPosition, ProgressDocument, StepProgress, SubtaskProgress, fields};
pub use repository::ProgressRepository;

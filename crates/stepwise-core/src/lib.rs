//! Domain layer for the Stepwise learning client.
//!
//! Holds the catalog and progress models, the pure navigation rules and the
//! traits the outer layers implement (progress/transcript repositories,
//! catalog source, assistant backend, auth provider).

pub mod assistant;
pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod location;
pub mod navigation;
pub mod progress;
pub mod transcript;

pub use error::{Result, StepwiseError};
pub use location::StepLocation;

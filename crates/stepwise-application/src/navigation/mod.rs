//! Task navigation: catalog, progress resume and step gating.

mod engine;

pub use engine::{ActiveStep, NavigationEngine};

//! Catalog domain module.
//!
//! # Module Structure
//!
//! - `model`: `Task`, `Subtask`, `Step`, `TeamMember`
//! - `source`: `CatalogSource` trait for loading the catalog

mod model;
pub mod source;

pub use model::{Step, Subtask, Task, TaskProgress, TeamMember, team_member_for_role};
pub use source::CatalogSource;

#[cfg(test)]
pub(crate) use model::fixtures;

//! Navigation domain module: selection state and unlock/successor rules.

mod rules;
mod selection;

pub use rules::{Successor, furthest_progress, is_step_accessible, successor};
pub use selection::{Selection, SelectionState};

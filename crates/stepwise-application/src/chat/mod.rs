//! Per-step chat and submission state.

mod session;

pub use session::{APOLOGY_MESSAGE, ChatSession};

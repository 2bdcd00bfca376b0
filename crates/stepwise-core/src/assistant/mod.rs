//! Assistant backend module: chat streaming and submission validation.

mod backend;
mod model;

pub use backend::{AssistantBackend, ChatStream};
pub use model::{
    ChatEvent, ChatRequest, SubtaskContext, ValidationOutcome, ValidationRequest,
};

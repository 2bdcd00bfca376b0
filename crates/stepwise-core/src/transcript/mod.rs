//! Chat transcript domain module.
//!
//! Transcripts are stored apart from the progress document so that chat
//! history never grows the progress document.

mod model;
pub mod repository;

pub use model::{
    ChatMessage, MessageRole, Transcript, TranscriptKey, TranscriptSummary, welcome_text,
};
pub use repository::TranscriptRepository;

//! Application layer for Stepwise: the navigation engine, the chat session
//! and the client that owns them.

pub mod chat;
pub mod client;
pub mod connectivity;
pub mod navigation;

pub use chat::ChatSession;
pub use client::{ClientComponents, StepwiseClient};
pub use connectivity::ConnectivityMonitor;
pub use navigation::{ActiveStep, NavigationEngine};

//! Wire DTOs and the normalizing boundary for backend payloads.
//!
//! Loosely-typed JSON from the backend is decoded here exactly once; the rest
//! of the client only sees the typed domain values.

pub mod catalog;

pub use catalog::{tasks_from_payload, team_members_from_payload};

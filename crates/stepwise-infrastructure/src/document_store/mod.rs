//! Document store abstraction.
//!
//! Models the remote document database the client persists to: JSON
//! documents addressed by slash-separated paths, with targeted field-path
//! updates so that independent writers touching disjoint fields never
//! overwrite each other.

mod json_file;
mod memory;
mod path;

pub use json_file::JsonFileDocumentStore;
pub use memory::InMemoryDocumentStore;
pub use path::DocumentPath;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use stepwise_core::error::{Result, StepwiseError};

/// What a field update does to the value at its path.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Replace the value.
    Set(Value),
    /// Add to a numeric value; a missing field counts as zero.
    Increment(i64),
    /// Append each value not already present; a missing field counts as empty.
    ArrayUnion(Vec<Value>),
    /// Store the store's current time.
    ServerTimestamp,
}

/// One targeted write inside a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub path: Vec<String>,
    pub op: FieldOp,
}

impl FieldUpdate {
    pub fn new<S: AsRef<str>>(path: &[S], op: FieldOp) -> Self {
        Self {
            path: path.iter().map(|s| s.as_ref().to_string()).collect(),
            op,
        }
    }

    pub fn set<S: AsRef<str>>(path: &[S], value: impl Into<Value>) -> Self {
        Self::new(path, FieldOp::Set(value.into()))
    }

    pub fn increment<S: AsRef<str>>(path: &[S], by: i64) -> Self {
        Self::new(path, FieldOp::Increment(by))
    }

    pub fn array_union<S: AsRef<str>>(path: &[S], values: Vec<Value>) -> Self {
        Self::new(path, FieldOp::ArrayUnion(values))
    }

    pub fn server_timestamp<S: AsRef<str>>(path: &[S]) -> Self {
        Self::new(path, FieldOp::ServerTimestamp)
    }
}

/// An abstract document store.
///
/// # Implementation Notes
///
/// `update` must apply all of its field updates atomically with respect to
/// other writers of the same document.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads a document, `Ok(None)` when it does not exist.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Value>>;

    /// Writes a new document; fails with `AlreadyExists` if one is there.
    async fn create(&self, path: &DocumentPath, document: Value) -> Result<()>;

    /// Writes a document, replacing any existing one.
    async fn set(&self, path: &DocumentPath, document: Value) -> Result<()>;

    /// Applies field updates to an existing document; `NotFound` when missing.
    async fn update(&self, path: &DocumentPath, updates: &[FieldUpdate]) -> Result<()>;

    /// Removes a document. Missing documents are not an error.
    async fn delete(&self, path: &DocumentPath) -> Result<()>;
}

/// Reads a document and deserializes it into `T`.
pub async fn load_document<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocumentPath,
) -> Result<Option<T>> {
    match store.get(path).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Applies `updates` to `document` in order.
///
/// Intermediate maps are created as needed. Traversing through a non-object
/// value is an error and leaves `document` partially updated, so callers
/// apply updates to a copy.
pub(crate) fn apply_updates(
    document: &mut Value,
    updates: &[FieldUpdate],
    now: DateTime<Utc>,
) -> Result<()> {
    for update in updates {
        let (last, parents) = update
            .path
            .split_last()
            .ok_or_else(|| StepwiseError::data_access("empty field path"))?;

        let mut cursor = &mut *document;
        for segment in parents {
            let object = cursor.as_object_mut().ok_or_else(|| {
                StepwiseError::data_access(format!(
                    "cannot traverse non-object at '{}'",
                    update.path.join(".")
                ))
            })?;
            cursor = object
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }

        let object = cursor.as_object_mut().ok_or_else(|| {
            StepwiseError::data_access(format!(
                "cannot set field on non-object at '{}'",
                update.path.join(".")
            ))
        })?;

        match &update.op {
            FieldOp::Set(value) => {
                object.insert(last.clone(), value.clone());
            }
            FieldOp::Increment(by) => {
                let current = object.get(last).and_then(Value::as_i64).unwrap_or(0);
                object.insert(last.clone(), Value::from(current + by));
            }
            FieldOp::ArrayUnion(values) => {
                let entry = object
                    .entry(last.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(items) = entry {
                    for value in values {
                        if !items.contains(value) {
                            items.push(value.clone());
                        }
                    }
                }
            }
            FieldOp::ServerTimestamp => {
                object.insert(last.clone(), Value::String(now.to_rfc3339()));
            }
        }
    }
    Ok(())
}

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

use super::events::EventSink;

/// A stored JSON document. The identifier lives under [`ID_FIELD`].
pub type Document = Map<String, Value>;

/// Name of the identifier field inside every document
pub const ID_FIELD: &str = "_id";

/// Errors reported by a store driver
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("{0}")]
    Driver(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Options for `find`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// Options for writes. `w` is the requested write-concern level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub w: Option<u32>,
}

impl WriteOptions {
    /// Acknowledged writes (`w = 1`)
    pub fn acknowledged() -> Self {
        Self { w: Some(1) }
    }
}

/// Opens connections to a document store
#[async_trait]
pub trait StoreConnector: Send + Sync {
    /// Open a new connection to `uri`. Asynchronous driver failures on the
    /// returned connection are published through `events`.
    async fn connect(&self, uri: &str, events: EventSink) -> Result<Arc<dyn Connection>, StoreError>;
}

/// A live link to the store
pub trait Connection: Send + Sync {
    fn collection(&self, name: &str) -> Arc<dyn Collection>;
}

/// Document operations on a single named collection
#[async_trait]
pub trait Collection: Send + Sync {
    async fn find(&self, criteria: &Document, options: &FindOptions) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, criteria: &Document) -> Result<Option<Document>, StoreError>;

    /// Insert a document, assigning an identifier when it has none.
    /// Returns the document as stored.
    async fn insert(&self, document: Document, options: &WriteOptions) -> Result<Document, StoreError>;

    /// Replace the body of the first matching document, keeping its identifier.
    /// Returns the number of matched documents.
    async fn update(&self, criteria: &Document, document: Document, options: &WriteOptions) -> Result<u64, StoreError>;

    /// Delete every matching document. Returns the number removed.
    async fn remove(&self, criteria: &Document, options: &WriteOptions) -> Result<u64, StoreError>;
}

/// Read the identifier of a document, if it carries a string one
pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(Value::as_str)
}

/// Return the identifier to store for `document`, generating one when absent
pub fn ensure_document_id(document: &mut Document) -> Result<String, StoreError> {
    match document.get(ID_FIELD) {
        None | Some(Value::Null) => {
            let id = uuid::Uuid::new_v4().to_string();
            document.insert(ID_FIELD.to_string(), Value::String(id.clone()));
            Ok(id)
        }
        Some(Value::String(id)) => Ok(id.clone()),
        Some(other) => Err(StoreError::InvalidDocument(format!(
            "{} must be a string, got {}",
            ID_FIELD, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn generates_missing_id() {
        let mut doc = json!({ "name": "x" }).as_object().cloned().unwrap();
        let id = ensure_document_id(&mut doc).unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(document_id(&doc), Some(id.as_str()));
    }

    #[test]
    fn keeps_existing_string_id() {
        let mut doc = json!({ "_id": "abc" }).as_object().cloned().unwrap();
        assert_eq!(ensure_document_id(&mut doc).unwrap(), "abc");
    }

    #[test]
    fn rejects_non_string_id() {
        let mut doc = json!({ "_id": 7 }).as_object().cloned().unwrap();
        assert!(matches!(ensure_document_id(&mut doc), Err(StoreError::InvalidDocument(_))));
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::RwLock;

use super::events::EventSink;
use super::store::{
    document_id, ensure_document_id, Collection, Connection, Document, FindOptions, StoreConnector,
    StoreError, WriteOptions, ID_FIELD,
};
use crate::filter;

/// Process-local document store. Every `connect` yields a new, empty connection.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    connects: AtomicUsize,
    connect_delay: Option<Duration>,
    fail_uris: Mutex<Vec<String>>,
    opened: Mutex<HashMap<String, Arc<MemoryConnection>>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every connection establishment, making concurrent first access observable
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Make connections to `uri` fail until cleared
    pub fn fail_uri(&self, uri: impl Into<String>) {
        self.fail_uris
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(uri.into());
    }

    pub fn clear_failures(&self) {
        self.fail_uris
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of connections opened so far
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// The most recent connection opened to `uri`
    pub fn connection(&self, uri: &str) -> Option<Arc<MemoryConnection>> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(uri)
            .cloned()
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, uri: &str, events: EventSink) -> Result<Arc<dyn Connection>, StoreError> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }

        let refused = self
            .fail_uris
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|u| u == uri);
        if refused {
            return Err(StoreError::Connection(format!("connection refused: {}", uri)));
        }

        self.connects.fetch_add(1, Ordering::SeqCst);
        let connection = Arc::new(MemoryConnection::new(events));
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(uri.to_string(), connection.clone());
        Ok(connection as Arc<dyn Connection>)
    }
}

/// One in-memory database
#[derive(Debug)]
pub struct MemoryConnection {
    events: EventSink,
    collections: Mutex<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryConnection {
    pub fn new(events: EventSink) -> Self {
        Self {
            events,
            collections: Mutex::new(HashMap::new()),
        }
    }

    /// Names of collections touched through this connection
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Publish a driver error as an established connection would on transport failure
    pub fn report_error(&self, message: impl Into<String>) {
        self.events.error(message);
    }
}

impl Connection for MemoryConnection {
    fn collection(&self, name: &str) -> Arc<dyn Collection> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .entry(name.to_string())
            .or_default()
            .clone()
    }
}

#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: RwLock<Vec<Document>>,
}

#[async_trait]
impl Collection for MemoryCollection {
    async fn find(&self, criteria: &Document, options: &FindOptions) -> Result<Vec<Document>, StoreError> {
        let documents = self.documents.read().await;
        let skip = options.skip.unwrap_or(0).max(0) as usize;
        let limit = options.limit.map_or(usize::MAX, |l| l.max(0) as usize);

        Ok(documents
            .iter()
            .filter(|d| filter::matches(d, criteria))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_one(&self, criteria: &Document) -> Result<Option<Document>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().find(|d| filter::matches(d, criteria)).cloned())
    }

    async fn insert(&self, mut document: Document, _options: &WriteOptions) -> Result<Document, StoreError> {
        let id = ensure_document_id(&mut document)?;

        let mut documents = self.documents.write().await;
        if documents.iter().any(|d| document_id(d) == Some(id.as_str())) {
            return Err(StoreError::DuplicateKey(format!("{} {}", ID_FIELD, id)));
        }
        documents.push(document.clone());
        Ok(document)
    }

    async fn update(&self, criteria: &Document, mut document: Document, _options: &WriteOptions) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let Some(existing) = documents.iter_mut().find(|d| filter::matches(d, criteria)) else {
            return Ok(0);
        };

        match existing.get(ID_FIELD) {
            Some(id) => document.insert(ID_FIELD.to_string(), id.clone()),
            None => document.remove(ID_FIELD),
        };
        *existing = document;
        Ok(1)
    }

    async fn remove(&self, criteria: &Document, _options: &WriteOptions) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|d| !filter::matches(d, criteria));
        Ok((before - documents.len()) as u64)
    }
}

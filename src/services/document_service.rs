use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::database::manager::TenantRegistry;
use crate::database::store::{Collection, Document, FindOptions, StoreError, WriteOptions, ID_FIELD};
use crate::error::ApiError;
use crate::middleware::response::{Outcome, Payload};

/// Default cap on `query` results when the caller sets no limit
pub const DEFAULT_QUERY_LIMIT: i64 = 100;

/// The five document operations behind the route table
#[async_trait]
pub trait Translator: Send + Sync {
    async fn query(&self, tenant: &str, criteria: Document, options: FindOptions) -> Outcome;

    async fn get(&self, tenant: &str, criteria: Document) -> Outcome;

    async fn create(&self, tenant: &str, document: Document) -> Outcome;

    async fn update(&self, tenant: &str, criteria: Document, document: Document, options: Option<WriteOptions>) -> Outcome;

    async fn remove(&self, tenant: &str, criteria: Document) -> Outcome;
}

/// Translates document operations onto a tenant's store collection
pub struct DocumentService {
    registry: Arc<TenantRegistry>,
    collection: String,
    default_limit: i64,
}

impl DocumentService {
    pub fn new(registry: Arc<TenantRegistry>, collection: impl Into<String>) -> Self {
        Self {
            registry,
            collection: collection.into(),
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: i64) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn registry(&self) -> &Arc<TenantRegistry> {
        &self.registry
    }

    /// The tenant's view of the base collection
    async fn collection(&self, tenant: &str) -> Result<Arc<dyn Collection>, ApiError> {
        let resolved = self.registry.resolve(tenant).await?;
        let name = resolved.collection_name(&self.collection);
        tracing::debug!("Resolved collection {} for tenant {}", name, tenant);
        Ok(resolved.connection.collection(&name))
    }
}

/// Shape a store result into an outcome.
///
/// Errors become 500, absent data becomes 404, and a list is collapsed to its
/// first element unless a list was expected.
pub fn shape(result: Result<Option<Value>, StoreError>, expect_array: bool) -> Outcome {
    let data = match result {
        Err(e) => return Err(e.into()),
        Ok(None) | Ok(Some(Value::Null)) => return Err(ApiError::not_found()),
        Ok(Some(data)) => data,
    };

    match (data, expect_array) {
        (Value::Array(items), true) => Ok(Payload::Documents(objects(items)?)),
        (Value::Array(items), false) => match items.into_iter().next() {
            Some(Value::Object(d)) => Ok(Payload::Document(d)),
            Some(_) => Err(ApiError::store("store returned a non-document value")),
            None => Err(ApiError::not_found()),
        },
        (Value::Object(d), true) => Ok(Payload::Documents(vec![d])),
        (Value::Object(d), false) => Ok(Payload::Document(d)),
        (_, _) => Err(ApiError::store("store returned a non-document value")),
    }
}

fn objects(items: Vec<Value>) -> Result<Vec<Document>, ApiError> {
    items
        .into_iter()
        .map(|v| match v {
            Value::Object(d) => Ok(d),
            _ => Err(ApiError::store("store returned a non-document value")),
        })
        .collect()
}

#[async_trait]
impl Translator for DocumentService {
    async fn query(&self, tenant: &str, criteria: Document, mut options: FindOptions) -> Outcome {
        // A zero limit means no limit was asked for
        if matches!(options.limit, None | Some(0)) {
            options.limit = Some(self.default_limit);
        }

        let collection = self.collection(tenant).await?;
        let result = collection.find(&criteria, &options).await;
        shape(result.map(|docs| Some(Value::Array(docs.into_iter().map(Value::Object).collect()))), true)
    }

    async fn get(&self, tenant: &str, criteria: Document) -> Outcome {
        let collection = self.collection(tenant).await?;
        let result = collection.find_one(&criteria).await;
        shape(result.map(|doc| doc.map(Value::Object)), false)
    }

    async fn create(&self, tenant: &str, document: Document) -> Outcome {
        let collection = self.collection(tenant).await?;
        let result = collection.insert(document, &WriteOptions::default()).await;
        shape(result.map(|doc| Some(Value::Object(doc))), false)
    }

    async fn update(&self, tenant: &str, criteria: Document, mut document: Document, options: Option<WriteOptions>) -> Outcome {
        // An identifier is never written through an update
        document.remove(ID_FIELD);
        let options = options.unwrap_or_else(WriteOptions::acknowledged);

        let collection = self.collection(tenant).await?;
        let matched = collection.update(&criteria, document.clone(), &options).await;

        let result = matched.map(|n| {
            (n > 0).then(|| {
                if let Some(id) = criteria.get(ID_FIELD) {
                    document.insert(ID_FIELD.to_string(), id.clone());
                }
                Value::Object(document)
            })
        });
        shape(result, false)
    }

    async fn remove(&self, tenant: &str, criteria: Document) -> Outcome {
        let collection = self.collection(tenant).await?;

        match collection.remove(&criteria, &WriteOptions::default()).await {
            Err(e) => Err(e.into()),
            // Nothing removed is reported as a bad request, not a 404
            Ok(0) => Err(ApiError::bad_request("")),
            Ok(_) => Ok(Payload::empty()),
        }
    }
}

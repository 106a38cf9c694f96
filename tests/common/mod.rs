#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use tenant_rest::auth::{generate_token, Claims};
use tenant_rest::database::memory::MemoryConnector;
use tenant_rest::database::{Document, FindOptions, Isolation, TenantRegistry};
use tenant_rest::{app, Gateway};

pub const SECRET: &str = "integration-secret";
pub const COLLECTION: &str = "documents";

/// A router over the in-memory store, plus handles for inspecting it
pub struct TestGateway {
    pub router: Router,
    pub connector: Arc<MemoryConnector>,
    pub registry: Arc<TenantRegistry>,
}

impl TestGateway {
    pub fn new(isolation: Isolation, mount: &str) -> Self {
        let connector = Arc::new(MemoryConnector::new());
        let registry = Arc::new(TenantRegistry::new(isolation, "memory://test/", connector.clone()));
        let gateway = Gateway::new(registry.clone(), COLLECTION, SECRET, mount);

        Self {
            router: app(gateway),
            connector,
            registry,
        }
    }

    pub fn isolated() -> Self {
        Self::new(Isolation::Isolated, "/")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder.body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))?;

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> Result<(StatusCode, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }

    /// Documents stored for `tenant` in the base collection, read directly from the store
    pub async fn stored(&self, tenant: &str) -> Result<Vec<Document>> {
        let resolved = self.registry.resolve(tenant).await?;
        let collection = resolved.connection.collection(&resolved.collection_name(COLLECTION));
        Ok(collection.find(&Document::new(), &FindOptions::default()).await?)
    }
}

pub fn token(bucket: &str) -> String {
    generate_token(&Claims::new(bucket, 1), SECRET).expect("sign token")
}

/// Assert the standard error envelope
pub fn assert_envelope(body: &Value, code: u16) {
    assert_eq!(body["success"], Value::Bool(false), "not an error envelope: {}", body);
    assert_eq!(body["code"], Value::from(code), "wrong code: {}", body);
    assert!(body["error"].is_string(), "missing error message: {}", body);
}

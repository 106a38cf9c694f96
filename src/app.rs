use anyhow::Context;
use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::{AppConfig, StoreKind};
use crate::database::manager::TenantRegistry;
use crate::database::memory::MemoryConnector;
use crate::database::postgres::PgConnector;
use crate::database::store::StoreConnector;
use crate::handlers;
use crate::middleware::auth::{resolve_authentication, Authenticator};
use crate::services::{DocumentService, Translator};

/// Base URI handed to the in-memory driver
const MEMORY_BASE_URI: &str = "memory://local/";

/// Everything the router needs
#[derive(Clone)]
pub struct Gateway {
    pub registry: Arc<TenantRegistry>,
    pub translator: Arc<dyn Translator>,
    pub authenticator: Authenticator,
    pub mount: String,
}

impl Gateway {
    /// Wire a gateway around `registry` with the default document service
    pub fn new(registry: Arc<TenantRegistry>, collection: &str, private_key: &str, mount: &str) -> Self {
        let translator = DocumentService::new(registry.clone(), collection);
        Self {
            registry,
            translator: Arc::new(translator),
            authenticator: Authenticator::new(private_key),
            mount: mount.to_string(),
        }
    }

    /// Build the gateway described by `config`
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        if config.security.private_key.is_empty() {
            anyhow::bail!("GATEWAY_PRIVATE_KEY (or JWT_SECRET) must be set");
        }

        let (connector, base_uri): (Arc<dyn StoreConnector>, String) = match config.gateway.store {
            StoreKind::Memory => (Arc::new(MemoryConnector::new()), MEMORY_BASE_URI.to_string()),
            StoreKind::Postgres => {
                let url = config
                    .database
                    .url
                    .clone()
                    .context("DATABASE_URL must be set for the postgres store")?;
                let connector = PgConnector::new(
                    config.database.max_connections,
                    Duration::from_secs(config.database.connection_timeout),
                );
                (Arc::new(connector), url)
            }
        };

        let registry = TenantRegistry::new(config.gateway.isolation(), base_uri, connector);
        let translator =
            DocumentService::new(Arc::new(registry), config.gateway.collection.clone())
                .with_default_limit(config.gateway.default_limit);

        Ok(Self {
            registry: translator.registry().clone(),
            translator: Arc::new(translator),
            authenticator: Authenticator::new(config.security.private_key.as_str()),
            mount: config.gateway.mount.clone(),
        })
    }
}

/// Normalise a mount prefix to `/segment[/segment...]`, or `/` for the root
pub fn normalize_mount(mount: &str) -> String {
    let trimmed = mount.trim().trim_matches('/');
    format!("/{}", trimmed)
}

pub fn app(gateway: Gateway) -> Router {
    let documents = handlers::document_routes(gateway.translator)
        .layer(middleware::from_fn_with_state(gateway.authenticator, resolve_authentication));

    let mount = normalize_mount(&gateway.mount);
    let router = if mount == "/" {
        Router::new().merge(documents)
    } else {
        Router::new().nest(&mount, documents)
    };

    router
        .merge(
            Router::new()
                .route("/health", get(handlers::health))
                .with_state(gateway.registry),
        )
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

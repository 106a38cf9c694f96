use anyhow::Context;
use clap::Args;
use tokio::sync::broadcast::error::RecvError;

use crate::app::{app, normalize_mount, Gateway};
use crate::config::{self, StoreKind};
use crate::database::RegistryEvent;

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    #[arg(long, help = "Listen port (overrides GATEWAY_PORT / PORT)")]
    pub port: Option<u16>,

    #[arg(long, help = "URL prefix for the document routes (overrides GATEWAY_MOUNT)")]
    pub mount: Option<String>,

    #[arg(long, help = "Store driver: postgres or memory (overrides GATEWAY_STORE)")]
    pub store: Option<StoreKind>,
}

pub async fn handle(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = config::config().clone();
    if let Some(port) = args.port {
        config.gateway.port = port;
    }
    if let Some(mount) = args.mount {
        config.gateway.mount = mount;
    }
    if let Some(store) = args.store {
        config.gateway.store = store;
    }

    tracing::info!("Starting tenant-rest in {:?} mode", config.environment);

    let gateway = Gateway::from_config(&config)?;
    spawn_event_logger(&gateway);

    let bind_addr = format!("0.0.0.0:{}", config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        "tenant-rest listening on http://{} (documents at {}, {:?} tenants, {:?} store)",
        bind_addr,
        normalize_mount(&config.gateway.mount),
        config.gateway.isolation(),
        config.gateway.store,
    );

    axum::serve(listener, app(gateway)).await.context("server")?;
    Ok(())
}

/// Log connection and driver error notifications from the tenant registry
fn spawn_event_logger(gateway: &Gateway) {
    let mut events = gateway.registry.subscribe();

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(RegistryEvent::Connected { tenant, at }) => {
                    tracing::info!("Store connected for {} at {}", tenant.as_deref().unwrap_or("<shared>"), at);
                }
                Ok(RegistryEvent::Error { tenant, message }) => {
                    tracing::warn!("Store error for {}: {}", tenant.as_deref().unwrap_or("<shared>"), message);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Dropped {} registry events", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

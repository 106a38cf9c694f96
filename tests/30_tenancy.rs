mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use futures::future::join_all;
use serde_json::json;

use common::{token, TestGateway};
use tenant_rest::database::{Isolation, RegistryEvent};

#[tokio::test]
async fn isolated_tenants_get_distinct_connections() -> Result<()> {
    let gw = TestGateway::new(Isolation::Isolated, "/");

    gw.send(Method::POST, "/", Some(&token("acme")), Some(r#"{"name":"a"}"#)).await?;
    gw.send(Method::POST, "/", Some(&token("globex")), Some(r#"{"name":"g"}"#)).await?;
    gw.send(Method::GET, "/", Some(&token("acme")), None).await?;

    assert_eq!(gw.connector.connect_count(), 2);

    let acme = gw.registry.resolve("acme").await?;
    let acme_again = gw.registry.resolve("acme").await?;
    let globex = gw.registry.resolve("globex").await?;
    assert!(Arc::ptr_eq(&acme.connection, &acme_again.connection));
    assert!(!Arc::ptr_eq(&acme.connection, &globex.connection));
    assert_eq!(acme.prefix, "");
    Ok(())
}

#[tokio::test]
async fn shared_mode_prefixes_collections_per_tenant() -> Result<()> {
    let gw = TestGateway::new(Isolation::Shared, "/");

    gw.send(Method::POST, "/", Some(&token("acme")), Some(r#"{"name":"a"}"#)).await?;
    gw.send(Method::POST, "/", Some(&token("globex")), Some(r#"{"name":"g"}"#)).await?;

    assert_eq!(gw.connector.connect_count(), 1);

    let acme = gw.registry.resolve("acme").await?;
    let globex = gw.registry.resolve("globex").await?;
    assert!(Arc::ptr_eq(&acme.connection, &globex.connection));
    assert_eq!(acme.prefix, "acme_");
    assert_eq!(globex.prefix, "globex_");

    let (status, body) = gw.send(Method::GET, "/", Some(&token("acme")), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["name"], json!("a"));

    let shared = gw.connector.connection("memory://test/").expect("shared connection");
    assert_eq!(shared.collection_names(), vec!["acme_documents", "globex_documents"]);
    Ok(())
}

#[tokio::test]
async fn concurrent_first_requests_share_one_connection() -> Result<()> {
    let gw = TestGateway::new(Isolation::Isolated, "/");
    let acme = token("acme");

    let responses = join_all((0..8).map(|_| gw.send(Method::GET, "/", Some(&acme), None))).await;

    for response in responses {
        let (status, _) = response?;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(gw.connector.connect_count(), 1);
    Ok(())
}

#[tokio::test]
async fn connection_failure_fails_the_request_and_is_published() -> Result<()> {
    let gw = TestGateway::new(Isolation::Isolated, "/");
    let mut events = gw.registry.subscribe();
    gw.connector.fail_uri("memory://test/acme");

    let (status, body) = gw.send(Method::GET, "/", Some(&token("acme")), None).await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    common::assert_envelope(&body, 500);

    match events.recv().await? {
        RegistryEvent::Error { tenant, .. } => assert_eq!(tenant.as_deref(), Some("acme")),
        other => panic!("unexpected event: {:?}", other),
    }

    gw.connector.clear_failures();
    let (status, _) = gw.send(Method::GET, "/", Some(&token("acme")), None).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

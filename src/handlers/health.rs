use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::database::manager::{Isolation, TenantRegistry};

/// GET /health - liveness plus a summary of established store connections
pub async fn health(State(registry): State<Arc<TenantRegistry>>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    let mode = match registry.isolation() {
        Isolation::Isolated => "isolated",
        Isolation::Shared => "shared",
    };

    Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": now,
            "tenant_mode": mode,
            "connections": registry.connection_count().await,
        }
    }))
}

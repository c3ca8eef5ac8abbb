/// Health check endpoints for liveness and readiness probes
use crate::context::AppContext;
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Readiness status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessStatus {
    /// "healthy" or "unhealthy"
    pub status: String,
    pub version: String,
    pub directory: ComponentHealth,
    pub registry_enabled: bool,
}

/// Health status of individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(liveness))
        .route("/health/ready", get(readiness))
}

async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Ready when the directory answers an authenticated call
async fn readiness(State(ctx): State<AppContext>) -> (StatusCode, Json<ReadinessStatus>) {
    let start = Instant::now();
    let result = ctx
        .directory
        .request("GET", "v1.0/organization?$select=id", None)
        .await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    let directory = match result {
        Ok(_) => ComponentHealth {
            status: "healthy".to_string(),
            response_time_ms,
            error: None,
        },
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            ComponentHealth {
                status: "unhealthy".to_string(),
                response_time_ms,
                error: Some(e.to_string()),
            }
        }
    };

    let healthy = directory.error.is_none();
    let status = ReadinessStatus {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        directory,
        registry_enabled: ctx.config.registry.enabled,
    };

    let code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

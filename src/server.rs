/// HTTP server setup and routing
use crate::{
    context::AppContext,
    error::{ErrorResponse, OnboardError, OnboardResult},
};
use axum::{http::StatusCode, response::Json, Router};
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the main application router
/// Returns Router<()> because state is already provided
pub fn build_router(ctx: AppContext) -> Router {
    Router::new()
        // Probes stay outside the function key guard
        .merge(crate::api::health::routes())
        .merge(crate::api::routes(ctx.clone()))
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .fallback(not_found)
}

async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Endpoint not found", Value::Null)),
    )
}

/// Start the HTTP server
pub async fn serve(ctx: AppContext) -> OnboardResult<()> {
    let addr = format!("{}:{}", ctx.config.service.hostname, ctx.config.service.port);

    info!("Starting onboarding verification service on {}", addr);
    info!("   Directory: {}", ctx.config.directory.url);
    if ctx.config.service.function_key.is_none() {
        info!("   No function key configured - /api routes are open");
    }

    let app = build_router(ctx);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OnboardError::Internal(format!("Failed to bind to {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| OnboardError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}

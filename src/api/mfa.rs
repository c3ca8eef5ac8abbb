/// MFA login URL endpoint
use crate::{context::AppContext, error::ErrorResponse};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/mfa/login-url", get(login_url))
}

#[derive(Debug, Deserialize)]
pub struct LoginUrlParams {
    pub log_entry_id: Option<String>,
    pub login_hint: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUrlResponse {
    pub login_url: String,
}

/// Generate an MFA login URL bound to a log entry
pub async fn login_url(
    State(ctx): State<AppContext>,
    Query(params): Query<LoginUrlParams>,
) -> Response {
    tracing::info!("New MFA login url request");

    let Some(log_entry_id) = params.log_entry_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("No log_entry_id in query params");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Missing log_entry_id query param", Value::Null)),
        )
            .into_response();
    };

    match ctx
        .mfa
        .login_url(&log_entry_id, params.login_hint.as_deref())
        .await
    {
        Ok(login_url) => (StatusCode::OK, Json(LoginUrlResponse { login_url })).into_response(),
        Err(e) => {
            tracing::error!("Failed when trying to get login url: {}", e);
            let data = match e.detail() {
                Value::Null => Value::String(e.to_string()),
                detail => detail,
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed when trying to get login url", data)),
            )
                .into_response()
        }
    }
}

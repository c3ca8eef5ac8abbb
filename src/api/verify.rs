/// Verification endpoint
use crate::{
    api::extract::ValidJson,
    context::AppContext,
    error::{ErrorResponse, OnboardError},
    registry::UserType,
    verify::{validate_ssn, AuditRecord},
};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new().route("/api/verify", post(verify_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub ssn: String,
    pub user_type: UserType,
    /// Generated when absent
    pub log_entry_id: Option<String>,
}

/// Resolve the directory identity for a person.
///
/// Failures answer with the partially annotated record as `data`.
pub async fn verify_user(
    State(ctx): State<AppContext>,
    ValidJson(req): ValidJson<VerifyRequest>,
) -> Result<Json<AuditRecord>, Response> {
    validate_ssn(&req.ssn).map_err(IntoResponse::into_response)?;

    let id = req
        .log_entry_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut record = AuditRecord::new(id, req.ssn, req.user_type);

    match ctx.resolver.resolve(&mut record).await {
        Ok(()) => Ok(Json(record)),
        Err(e) => {
            tracing::warn!(log_entry = %record.id, "Verification failed: {}", e);
            Err(failure_response(e, &record))
        }
    }
}

fn failure_response(err: OnboardError, record: &AuditRecord) -> Response {
    let status = err.status_code();
    let data = serde_json::to_value(record).unwrap_or_default();
    (status, Json(ErrorResponse::new(err.to_string(), data))).into_response()
}

/// Directory account operations: temporary access passes and passwords
use crate::{
    api::extract::ValidJson,
    context::AppContext,
    directory::TemporaryAccessPass,
    error::{OnboardError, OnboardResult},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppContext> {
    Router::new()
        .route(
            "/api/users/:id/temporary-access-pass",
            post(create_temporary_access_pass)
                .get(list_temporary_access_passes)
                .delete(delete_temporary_access_pass),
        )
        .route("/api/users/:id/password", patch(set_password))
}

pub async fn create_temporary_access_pass(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> OnboardResult<(StatusCode, Json<TemporaryAccessPass>)> {
    let pass = ctx.directory.create_temporary_access_pass(&user_id).await?;
    Ok((StatusCode::CREATED, Json(pass)))
}

pub async fn list_temporary_access_passes(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> OnboardResult<Json<Vec<TemporaryAccessPass>>> {
    Ok(Json(ctx.directory.get_temporary_access_passes(&user_id).await?))
}

/// 204 when the user had no pass to delete
pub async fn delete_temporary_access_pass(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
) -> OnboardResult<StatusCode> {
    ctx.directory.delete_temporary_access_pass(&user_id).await
}

#[derive(Debug, Deserialize)]
pub struct SetPasswordRequest {
    pub password: String,
}

pub async fn set_password(
    State(ctx): State<AppContext>,
    Path(user_id): Path<String>,
    ValidJson(req): ValidJson<SetPasswordRequest>,
) -> OnboardResult<StatusCode> {
    if req.password.is_empty() {
        return Err(OnboardError::Validation("Password cannot be empty".to_string()));
    }

    ctx.directory.set_password(&user_id, &req.password).await
}

/// Function key check for /api routes
use crate::{context::AppContext, error::OnboardError};
use axum::{
    extract::{Query, Request, State},
    http::{HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::warn;

pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";

#[derive(Debug, Deserialize)]
struct FunctionKeyQuery {
    code: Option<String>,
}

/// Key from the `x-functions-key` header or the `code` query parameter
pub fn extract_function_key(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    if let Some(key) = headers
        .get(FUNCTION_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
    {
        return Some(key.to_string());
    }

    Query::<FunctionKeyQuery>::try_from_uri(uri)
        .ok()
        .and_then(|Query(query)| query.code)
}

fn keys_match(expected: &str, given: &str) -> bool {
    let expected = expected.as_bytes();
    let given = given.as_bytes();
    expected.len() == given.len() && bool::from(expected.ct_eq(given))
}

/// Reject the request unless it carries the configured function key
pub async fn require_function_key(
    State(ctx): State<AppContext>,
    req: Request,
    next: Next,
) -> Result<Response, OnboardError> {
    let Some(expected) = ctx.config.service.function_key.as_deref() else {
        return Ok(next.run(req).await);
    };

    match extract_function_key(req.headers(), req.uri()) {
        Some(key) if keys_match(expected, &key) => Ok(next.run(req).await),
        Some(_) => {
            warn!("Rejected request with invalid function key");
            Err(OnboardError::Unauthorized("Invalid function key".to_string()))
        }
        None => Err(OnboardError::Unauthorized("Missing function key".to_string())),
    }
}

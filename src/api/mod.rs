/// API routes and handlers
pub mod extract;
pub mod health;
pub mod mfa;
pub mod middleware;
pub mod users;
pub mod verify;

use crate::context::AppContext;
use axum::{middleware::from_fn_with_state, Router};

/// Build the `/api` routes behind the function key guard
pub fn routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .merge(mfa::routes())
        .merge(verify::routes())
        .merge(users::routes())
        .route_layer(from_fn_with_state(ctx, middleware::require_function_key))
}

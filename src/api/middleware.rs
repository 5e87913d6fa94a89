//! Owner-capability middleware for the authoring routes.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::store::Store;

/// Reject authoring requests unless the persisted owner capability is set.
///
/// The capability is granted through the access gate (`POST /auth/verify`)
/// and survives restarts; there is nothing per-request to check beyond the
/// flag itself.
pub async fn require_owner(
    State(store): State<Store>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if store.is_owner() {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Authoring request without owner capability");
        Err(StatusCode::FORBIDDEN)
    }
}

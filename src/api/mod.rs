mod handlers;
pub mod middleware;

pub use handlers::{AuthStatus, FeedView, RenderedThought, VerifyInput};

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::store::Store;

pub fn create_router(store: Store) -> Router {
    let authoring = Router::new()
        .route("/thoughts", post(handlers::create_thought))
        .route("/thoughts/restore", post(handlers::restore_thought))
        .route("/thoughts/{id}", put(handlers::update_thought))
        .route("/thoughts/{id}", delete(handlers::delete_thought))
        .route_layer(from_fn_with_state(store.clone(), middleware::require_owner));

    let api = Router::new()
        // Feed
        .route("/thoughts", get(handlers::list_thoughts))
        .route("/thoughts/{id}", get(handlers::get_thought))
        .route("/thoughts/{id}/resonate", post(handlers::resonate_thought))
        .route("/thoughts/{id}/rendered", get(handlers::get_rendered))
        // Access gate
        .route("/auth", get(handlers::auth_status))
        .route("/auth", delete(handlers::sign_out))
        .route("/auth/verify", post(handlers::verify_key))
        // AI reflection
        .route("/reflection", get(handlers::get_reflection))
        // Health
        .route("/health", get(handlers::health))
        .merge(authoring);

    Router::new()
        .nest("/api/v1", api)
        // Deep links resolve at the root, like the original site
        .route("/", get(handlers::feed_root))
        .route("/status/{id}", get(handlers::deep_link))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(store)
}

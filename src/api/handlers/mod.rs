use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::deeplink::Route;
use crate::models::*;
use crate::reflect::ReflectClient;
use crate::render::render;
use crate::store::{Store, StoreError};

// ============================================================
// Error Handling
// ============================================================

/// Map a store error onto an HTTP response.
///
/// Validation failures carry their message (the submit path wants to know
/// why); everything else is logged server-side and sanitized so clients never
/// see internal detail.
fn store_error(e: StoreError) -> (StatusCode, String) {
    match e {
        StoreError::Validation(msg) => {
            tracing::warn!("Validation error: {}", msg);
            (StatusCode::UNPROCESSABLE_ENTITY, msg)
        }
        other => {
            tracing::error!("Internal error: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Thoughts
// ============================================================

/// Query parameters for listing the feed.
#[derive(Debug, Deserialize)]
pub struct ListThoughtsQuery {
    /// A category label, or `All` (the default) for the whole feed.
    pub category: Option<String>,
}

pub async fn list_thoughts(
    State(store): State<Store>,
    Query(query): Query<ListThoughtsQuery>,
) -> Result<Json<Vec<Thought>>, (StatusCode, String)> {
    let category = match query.category.as_deref() {
        None | Some("All") => None,
        Some(label) => match Category::from_str(label) {
            Some(category) => Some(category),
            None => {
                return Err((
                    StatusCode::UNPROCESSABLE_ENTITY,
                    format!("Unknown category: {label}"),
                ))
            }
        },
    };
    Ok(Json(store.filter(category)))
}

pub async fn get_thought(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Thought>, (StatusCode, String)> {
    store
        .get(id)
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Thought not found".to_string()))
}

pub async fn create_thought(
    State(store): State<Store>,
    Json(input): Json<CreateThoughtInput>,
) -> Result<(StatusCode, Json<Thought>), (StatusCode, String)> {
    store
        .create(input)
        .map(|t| (StatusCode::CREATED, Json(t)))
        .map_err(store_error)
}

pub async fn update_thought(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
    Json(input): Json<UpdateThoughtInput>,
) -> Result<Json<Thought>, (StatusCode, String)> {
    store
        .update(id, input)
        .map_err(store_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Thought not found".to_string()))
}

/// Delete is idempotent: removing an absent id is still a 204.
pub async fn delete_thought(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    store.delete(id).map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn restore_thought(
    State(store): State<Store>,
) -> Result<Json<Thought>, (StatusCode, String)> {
    store
        .restore_last_deleted()
        .map_err(store_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Nothing to restore".to_string()))
}

pub async fn resonate_thought(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<Thought>, (StatusCode, String)> {
    store
        .resonate(id)
        .map_err(store_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Thought not found".to_string()))
}

/// A thought's content rendered to restricted HTML-safe markup.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenderedThought {
    pub id: Uuid,
    pub html: String,
}

pub async fn get_rendered(
    State(store): State<Store>,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderedThought>, (StatusCode, String)> {
    store
        .get(id)
        .map(|t| {
            Json(RenderedThought {
                id: t.id,
                html: render(&t.content),
            })
        })
        .ok_or((StatusCode::NOT_FOUND, "Thought not found".to_string()))
}

// ============================================================
// Access gate
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyInput {
    pub secret: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatus {
    pub owner: bool,
}

pub async fn verify_key(
    State(store): State<Store>,
    Json(input): Json<VerifyInput>,
) -> Result<Json<AuthStatus>, (StatusCode, String)> {
    if store.verify(&input.secret).map_err(store_error)? {
        Ok(Json(AuthStatus { owner: true }))
    } else {
        Err((StatusCode::UNAUTHORIZED, "Invalid key".to_string()))
    }
}

pub async fn auth_status(State(store): State<Store>) -> Json<AuthStatus> {
    Json(AuthStatus {
        owner: store.is_owner(),
    })
}

pub async fn sign_out(State(store): State<Store>) -> Result<StatusCode, (StatusCode, String)> {
    store.clear_owner().map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================
// Reflection
// ============================================================

/// Reflection over the whole feed, or 204 when the collaborator has nothing
/// for us (empty feed, missing key, upstream failure). Never an error.
pub async fn get_reflection(State(store): State<Store>) -> axum::response::Response {
    let thoughts = store.filter(None);
    match ReflectClient::from_env().reflect(&thoughts).await {
        Some(reflection) => Json(reflection).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

// ============================================================
// Deep links
// ============================================================

/// What a deep link resolved to: a single opened thought, or the feed when
/// the path does not name a live one.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum FeedView {
    Reading { thought: Thought },
    Feed { thoughts: Vec<Thought> },
}

pub async fn feed_root(State(store): State<Store>) -> Json<FeedView> {
    Json(FeedView::Feed {
        thoughts: store.filter(None),
    })
}

/// `/status/{id}`: the resolver's fallback rules apply, so an unknown or
/// deleted id serves the feed with a 200 instead of erroring.
pub async fn deep_link(State(store): State<Store>, Path(raw): Path<String>) -> Json<FeedView> {
    if let Route::Thought(id) = Route::parse(&format!("/status/{raw}")) {
        if let Some(thought) = store.get(id) {
            return Json(FeedView::Reading { thought });
        }
    }
    Json(FeedView::Feed {
        thoughts: store.filter(None),
    })
}

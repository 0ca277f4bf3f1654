use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::store::JsonStore;

type SharedStore = Arc<JsonStore>;

const USERS: &str = "users";
const MEETING_TYPES: &str = "meeting_types";

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/api/hello", get(hello))
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/:handle",
            get(user_by_handle)
                .put(replace_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        .route("/api/users/:handle/meeting-types", get(meeting_types_by_handle))
        .route("/api/:collection", get(list).post(create))
        .route(
            "/api/:collection/:id",
            get(fetch).put(replace).patch(patch).delete(remove),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

/// Human-readable route table, logged on startup.
pub fn describe_routes(collections: &[String]) -> Vec<String> {
    let mut lines = vec![
        "GET    /api/hello".to_string(),
        "GET    /api/users/:handle/meeting-types".to_string(),
        "GET    /api/users/:handle".to_string(),
    ];
    for c in collections {
        lines.push(format!("GET    /api/{c}"));
        lines.push(format!("GET    /api/{c}/:id"));
        lines.push(format!("POST   /api/{c}"));
        lines.push(format!("PUT    /api/{c}/:id"));
        lines.push(format!("PATCH  /api/{c}/:id"));
        lines.push(format!("DELETE /api/{c}/:id"));
    }
    lines
}

// GET /api/hello
async fn hello() -> Json<Value> {
    Json(json!({ "message": "Hello, World!" }))
}

// GET /api/users/:handle
// Handles win over ids; the id lookup keeps `/api/users/:id` reachable.
async fn user_by_handle(
    State(store): State<SharedStore>,
    Path(handle): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if let Some(user) = store.find_by(USERS, "handle", &handle).await? {
        return Ok(Json(user));
    }
    store
        .find_by(USERS, "id", &handle)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User".into()))
}

// GET /api/users/:handle/meeting-types
async fn meeting_types_by_handle(
    State(store): State<SharedStore>,
    Path(handle): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let user = store
        .find_by(USERS, "handle", &handle)
        .await?
        .ok_or_else(|| ApiError::NotFound("User".into()))?;

    let user_id = match &user["id"] {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return Ok(Json(Vec::new())),
    };

    Ok(Json(store.filter_by(MEETING_TYPES, "userId", &user_id).await?))
}

async fn list_users(State(store): State<SharedStore>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(store.list(USERS).await?))
}

async fn create_user(
    State(store): State<SharedStore>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    Ok((StatusCode::CREATED, Json(store.insert(USERS, payload).await?)))
}

async fn replace_user(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(store.replace(USERS, &id, payload).await?))
}

async fn patch_user(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(store.patch(USERS, &id, payload).await?))
}

async fn delete_user(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    store.delete(USERS, &id).await?;
    Ok(Json(json!({})))
}

// Generic collection routes

async fn list(
    State(store): State<SharedStore>,
    Path(collection): Path<String>,
) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(store.list(&collection).await?))
}

async fn create(
    State(store): State<SharedStore>,
    Path(collection): Path<String>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    Ok((StatusCode::CREATED, Json(store.insert(&collection, payload).await?)))
}

async fn fetch(
    State(store): State<SharedStore>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(store.get(&collection, &id).await?))
}

async fn replace(
    State(store): State<SharedStore>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(store.replace(&collection, &id, payload).await?))
}

async fn patch(
    State(store): State<SharedStore>,
    Path((collection, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(store.patch(&collection, &id, payload).await?))
}

async fn remove(
    State(store): State<SharedStore>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    store.delete(&collection, &id).await?;
    Ok(Json(json!({})))
}

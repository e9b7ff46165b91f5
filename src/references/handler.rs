//! HTTP handlers for the references API
//!
//! REST endpoints over the store:
//! - GET    /health                     — liveness
//! - GET    /references                 — list artifacts (kind/tag filter)
//! - POST   /references                 — create artifact
//! - POST   /references/reindex         — reconcile manifest with disk
//! - GET    /references/:id             — artifact detail
//! - PATCH  /references/:id             — partial update
//! - DELETE /references/:id             — delete artifact and file
//! - GET    /references/:id/download    — raw content with the artifact's mime type

use crate::references::store::ReferencesStore;
use crate::references::types::*;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

/// Shared state for reference handlers
#[derive(Clone)]
pub struct RefsState {
    pub store: Arc<ReferencesStore>,
}

/// Create the references router with all REST endpoints
pub fn references_router(state: RefsState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/references", get(list_references))
        .route("/references", post(create_reference))
        .route("/references/reindex", post(reindex_references))
        .route(
            "/references/:id",
            get(get_reference)
                .patch(update_reference)
                .delete(delete_reference),
        )
        .route("/references/:id/download", get(download_reference))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    kind: Option<String>,
    tag: Option<String>,
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<serde_json::Value>) {
    tracing::error!("references API error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::to_value(ApiError::internal(e.to_string())).unwrap()),
    )
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// GET /references
async fn list_references(
    State(state): State<RefsState>,
    Query(params): Query<ListQuery>,
) -> impl IntoResponse {
    let mut items = match state.store.list().await {
        Ok(items) => items,
        Err(e) => return internal_error(e).into_response(),
    };

    if let Some(kind) = &params.kind {
        items.retain(|item| &item.kind == kind);
    }
    if let Some(tag) = &params.tag {
        items.retain(|item| item.tags.iter().any(|t| t == tag));
    }

    Json(ListReferencesResponse { items }).into_response()
}

/// POST /references
async fn create_reference(
    State(state): State<RefsState>,
    Json(request): Json<CreateArtifactRequest>,
) -> impl IntoResponse {
    match state.store.create(request).await {
        Ok(artifact) => (StatusCode::CREATED, Json(artifact)).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// POST /references/reindex
async fn reindex_references(State(state): State<RefsState>) -> impl IntoResponse {
    match state.store.reconcile().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// GET /references/:id
async fn get_reference(
    State(state): State<RefsState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get(&id).await {
        Ok(Some(artifact)) => (StatusCode::OK, Json(artifact)).into_response(),
        Ok(None) => not_found(&id).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// PATCH /references/:id
async fn update_reference(
    State(state): State<RefsState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateArtifactRequest>,
) -> impl IntoResponse {
    match state.store.update(&id, request).await {
        Ok(Some(artifact)) => (StatusCode::OK, Json(artifact)).into_response(),
        Ok(None) => not_found(&id).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// DELETE /references/:id
async fn delete_reference(
    State(state): State<RefsState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(&id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(&id).into_response(),
        Err(e) => internal_error(e).into_response(),
    }
}

/// GET /references/:id/download
async fn download_reference(
    State(state): State<RefsState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let artifact = match state.store.get(&id).await {
        Ok(Some(artifact)) => artifact,
        Ok(None) => return not_found(&id).into_response(),
        Err(e) => return internal_error(e).into_response(),
    };

    let path = state.store.artifact_path(&artifact);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let mime = if artifact.mime_type.is_empty() {
                "application/octet-stream".to_string()
            } else {
                artifact.mime_type
            };
            ([(header::CONTENT_TYPE, mime)], bytes).into_response()
        }
        Err(_) => (
            StatusCode::NOT_FOUND,
            Json(
                serde_json::to_value(ApiError::missing_file(format!(
                    "No file on disk for artifact {}",
                    id
                )))
                .unwrap(),
            ),
        )
            .into_response(),
    }
}

fn not_found(id: &str) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(
            serde_json::to_value(ApiError::not_found(format!("Artifact {} not found", id)))
                .unwrap(),
        ),
    )
}

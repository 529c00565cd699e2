//! Document routes — capture, listing, retrieval, deletion.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use medsift_core::{Error, SourceKind};
use medsift_store::Document;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/documents", post(capture_document).get(list_documents))
        .route("/documents/{id}", get(get_document).delete(delete_document))
}

#[derive(Deserialize)]
struct CaptureDocumentRequest {
    source: SourceKind,
    external_id: String,
    title: String,
    #[serde(default)]
    payload: serde_json::Value,
    link: Option<String>,
}

async fn capture_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CaptureDocumentRequest>,
) -> impl IntoResponse {
    match state.store.document_exists(&req.external_id, req.source) {
        Ok(true) => {
            return (
                StatusCode::CONFLICT,
                Json(serde_json::json!({
                    "error": format!("document {} already captured", req.external_id)
                })),
            )
                .into_response();
        }
        Ok(false) => {}
        Err(e) => return internal_error(e),
    }

    let doc = Document::new(req.source, req.external_id, req.title, req.payload, req.link);
    match state.store.add_document(&doc) {
        Ok(()) => (StatusCode::CREATED, Json(serde_json::json!(doc))).into_response(),
        Err(Error::DuplicateDocument(external_id)) => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({
                "error": format!("document {} already captured", external_id)
            })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: usize,
    #[serde(default = "default_page_size")]
    page_size: usize,
}

fn default_page() -> usize {
    1
}

fn default_page_size() -> usize {
    20
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> impl IntoResponse {
    match state.store.documents_paginated(query.page, query.page_size) {
        Ok((docs, total)) => Json(serde_json::json!({
            "documents": docs,
            "total": total,
            "page": query.page,
            "pageSize": query.page_size,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_document(&id) {
        Ok(Some(doc)) => Json(serde_json::json!(doc)).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => internal_error(e),
    }
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_document(&id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => not_found(&id),
        Err(e) => internal_error(e),
    }
}

fn not_found(id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("document {} not found", id)})),
    )
        .into_response()
}

fn internal_error(e: Error) -> axum::response::Response {
    tracing::error!("Document route error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}

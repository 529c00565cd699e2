//! Analysis result routes — listing, retrieval, frequent terms, manual trigger.
//!
//! Pass-through query operations over the store; no business logic here.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::state::AppState;
use medsift_core::{AnalysisKind, Error};
use medsift_store::ResultFilter;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/analysis/results", get(list_results))
        .route(
            "/analysis/results/{id}",
            get(get_result).delete(delete_result),
        )
        .route("/analysis/frequent-terms", get(frequent_terms))
        .route("/analysis/run", post(trigger_run))
}

#[derive(Deserialize)]
struct ListResultsQuery {
    kind: Option<String>,
    document_id: Option<String>,
    keyword: Option<String>,
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

async fn list_results(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListResultsQuery>,
) -> impl IntoResponse {
    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    let filter = ResultFilter {
        kind,
        document_id: query.document_id,
        keyword: query.keyword,
    };

    match state.store.list_results(&filter, query.page, query.page_size) {
        Ok((results, total)) => Json(serde_json::json!({
            "results": results,
            "total": total,
            "page": query.page,
            "pageSize": query.page_size,
        }))
        .into_response(),
        Err(e) => internal_error(e),
    }
}

async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_result(&id) {
        Ok(Some(result)) => Json(serde_json::json!(result)).into_response(),
        Ok(None) => not_found(&id),
        Err(e) => internal_error(e),
    }
}

async fn delete_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_result(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(Error::NotFound(_)) => not_found(&id),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct FrequentTermsQuery {
    #[serde(default = "default_terms_limit")]
    limit: usize,
    kind: Option<String>,
}

fn default_terms_limit() -> usize {
    50
}

async fn frequent_terms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FrequentTermsQuery>,
) -> impl IntoResponse {
    let kind = match parse_kind(query.kind.as_deref()) {
        Ok(kind) => kind,
        Err(resp) => return resp,
    };
    match state.store.most_frequent_terms(query.limit, kind) {
        Ok(terms) => Json(serde_json::json!({"terms": terms})).into_response(),
        Err(e) => internal_error(e),
    }
}

async fn trigger_run(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.scheduler.trigger_now().await {
        Ok(report) => (StatusCode::ACCEPTED, Json(serde_json::json!(report))).into_response(),
        Err(Error::Internal(msg)) if msg.contains("already in progress") => (
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": msg})),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

fn parse_kind(
    raw: Option<&str>,
) -> std::result::Result<Option<AnalysisKind>, axum::response::Response> {
    match raw {
        None => Ok(None),
        Some(s) => match AnalysisKind::parse(s) {
            Some(kind) => Ok(Some(kind)),
            None => Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": format!("unknown analysis kind: {}", s)})),
            )
                .into_response()),
        },
    }
}

fn not_found(id: &str) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": format!("analysis result {} not found", id)})),
    )
        .into_response()
}

fn internal_error(e: Error) -> axum::response::Response {
    tracing::error!("Analysis route error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({"error": e.to_string()})),
    )
        .into_response()
}

//! Service health and store statistics.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let stats = state.store.get_stats().ok();
    Json(serde_json::json!({
        "status": "healthy",
        "service": "medsift",
        "documents": stats.as_ref().map(|s| s.total_documents).unwrap_or(0),
        "results": stats.as_ref().map(|s| s.total_results).unwrap_or(0),
        "frequentTerms": stats.as_ref().map(|s| s.frequent_terms_rows).unwrap_or(0),
    }))
}

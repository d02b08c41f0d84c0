use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

use crate::infrastructure::repositories::FileContentStore;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Ready when the audio store directory can be reached
pub async fn health_ready(State(store): State<Arc<FileContentStore>>) -> impl IntoResponse {
    match tokio::fs::metadata(store.root()).await {
        Ok(metadata) if metadata.is_dir() => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "store": "available"
            })),
        ),
        Ok(_) | Err(_) => {
            tracing::warn!(root = %store.root().display(), "Audio store is not reachable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "not_ready",
                    "store": "unavailable"
                })),
            )
        }
    }
}

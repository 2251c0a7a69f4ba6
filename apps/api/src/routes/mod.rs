pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post},
    Router,
};

use crate::export::handlers as export;
use crate::extract::handlers as extract;
use crate::history::handlers as history;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Ingestion
        .route(
            "/api/v1/extract",
            post(extract::handle_extract).layer(upload_limit),
        )
        // Tailoring
        .route("/api/v1/tailor", post(tailoring::handle_tailor))
        .route(
            "/api/v1/flows/:flow_id",
            delete(tailoring::handle_cancel_flow),
        )
        // History
        .route("/api/v1/history", get(history::handle_list_history))
        .route("/api/v1/history/:id", get(history::handle_get_entry))
        .route(
            "/api/v1/history/:id/favorite",
            patch(history::handle_set_favorite),
        )
        .route(
            "/api/v1/history/:id/downloaded",
            patch(history::handle_set_downloaded),
        )
        // Export
        .route(
            "/api/v1/history/:id/export",
            post(export::handle_export_entry),
        )
        .route("/api/v1/export", post(export::handle_export_text))
        .with_state(state)
}

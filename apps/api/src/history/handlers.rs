use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::history::HistoryFilter;
use crate::models::history::HistoryEntry;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct FavoriteToggle {
    pub is_favorite: bool,
}

#[derive(Deserialize)]
pub struct DownloadedToggle {
    pub is_downloaded: bool,
}

/// GET /api/v1/history
pub async fn handle_list_history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    Ok(Json(state.history.query(&filter).await?))
}

/// GET /api/v1/history/:id
pub async fn handle_get_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryEntry>, AppError> {
    Ok(Json(state.history.get(id).await?))
}

/// PATCH /api/v1/history/:id/favorite
pub async fn handle_set_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FavoriteToggle>,
) -> Result<StatusCode, AppError> {
    state.history.set_favorite(id, req.is_favorite).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/v1/history/:id/downloaded
pub async fn handle_set_downloaded(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<DownloadedToggle>,
) -> Result<StatusCode, AppError> {
    state.history.set_downloaded(id, req.is_downloaded).await?;
    Ok(StatusCode::NO_CONTENT)
}

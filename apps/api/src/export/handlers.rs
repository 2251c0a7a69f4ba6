use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::export::{RenderSurface, RenderedDocument, DEFAULT_TARGET};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct ExportEntryRequest {
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Deserialize)]
pub struct ExportTextRequest {
    pub text: String,
    #[serde(default)]
    pub target: Option<String>,
}

/// POST /api/v1/history/:id/export
///
/// Renders the entry's tailored text and marks the entry as downloaded.
pub async fn handle_export_entry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Option<Json<ExportEntryRequest>>,
) -> Result<Response, AppError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let entry = state.history.get(id).await?;

    let mut surface = RenderSurface::new(id.to_string());
    surface.mount(DEFAULT_TARGET, entry.outcome.tailored_resume);
    let selector = req.target.as_deref().unwrap_or(DEFAULT_TARGET);

    let rendered = state.exporter.render(&surface, selector).await?;

    // The document is already rendered; a failed flag write must not lose it.
    if let Err(e) = state.history.set_downloaded(id, true).await {
        warn!(entry_id = %id, error = %e, "Failed to mark entry as downloaded");
    }
    info!(entry_id = %id, pages = rendered.page_count, "Exported history entry");
    Ok(pdf_response(rendered))
}

/// POST /api/v1/export
///
/// Renders an unsaved block of text.
pub async fn handle_export_text(
    State(state): State<AppState>,
    Json(req): Json<ExportTextRequest>,
) -> Result<Response, AppError> {
    if req.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let mut surface = RenderSurface::new(format!("unsaved-{}", Uuid::new_v4()));
    surface.mount(DEFAULT_TARGET, req.text);
    let selector = req.target.as_deref().unwrap_or(DEFAULT_TARGET);

    let rendered = state.exporter.render(&surface, selector).await?;
    Ok(pdf_response(rendered))
}

fn pdf_response(rendered: RenderedDocument) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", rendered.filename),
            ),
        ],
        rendered.bytes,
    )
        .into_response()
}

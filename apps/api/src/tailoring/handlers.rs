use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::history::{EntryMeta, HistoryEntry};
use crate::state::AppState;
use crate::tailoring::flow::{flow_key, run_flow};
use crate::tailoring::TailorRequest;

#[derive(Deserialize)]
pub struct SubmitTailorRequest {
    /// Identifies the client view; a newer submission on the same flow
    /// supersedes an older one.
    pub flow_id: String,
    pub resume_text: String,
    pub job_description_text: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// POST /api/v1/tailor
///
/// Sends the resume and job description to the tailoring service and archives
/// the outcome. Service failures still produce an archived sentinel entry.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(req): Json<SubmitTailorRequest>,
) -> Result<(StatusCode, Json<HistoryEntry>), AppError> {
    let flow_id = flow_key(&req.flow_id).to_string();
    if flow_id.is_empty() {
        return Err(AppError::Validation("flow_id cannot be empty".to_string()));
    }
    let request = TailorRequest::new(req.resume_text, req.job_description_text)?;
    let meta = EntryMeta {
        title: req.title,
        company: req.company,
        tags: req.tags,
    };

    let entry = run_flow(
        &state.tailor,
        &state.flows,
        &state.history,
        &flow_id,
        request,
        meta,
    )
    .await?;

    info!(
        entry_id = %entry.id,
        flow_id = %flow_id,
        match_score = entry.outcome.match_score,
        failed = entry.outcome.is_failure(),
        "Tailor request completed"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /api/v1/flows/:flow_id
///
/// Supersedes the in-flight submission, if any. Its response is discarded.
pub async fn handle_cancel_flow(
    State(state): State<AppState>,
    Path(flow_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let flow_id = flow_key(&flow_id);
    if state.flows.cancel(flow_id) {
        info!(
            flow_id = %flow_id,
            active_flows = state.flows.active_flows(),
            "Cancelled tailoring flow"
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("No active flow '{flow_id}'")))
    }
}

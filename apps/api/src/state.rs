use crate::export::ExportRenderer;
use crate::history::HistoryStore;
use crate::tailoring::flow::FlowTracker;
use crate::tailoring::TailoringClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub tailor: TailoringClient,
    /// Active generation per client flow; stale tailoring responses are dropped.
    pub flows: FlowTracker,
    pub history: HistoryStore,
    pub exporter: ExportRenderer,
    /// Body limit applied to document uploads.
    pub max_upload_bytes: usize,
}

//! Export Renderer: turns a finished block of tailored text into a
//! paginated, downloadable PDF.
//!
//! Text is mounted on a `RenderSurface` under a target name. Rendering looks
//! the target up, lays it out with line positions snapped to a
//! 2x grid (text stays vector) and serializes the pages.
//! A target can only have one export in flight; the busy flag is cleared when
//! the render finishes, whatever the outcome.

pub mod handlers;
pub mod layout;
pub mod metrics;
pub mod pdf;

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::info;

use crate::export::layout::paginate;
pub use crate::export::metrics::{default_page_setup, PageSetup};
use crate::export::metrics::HELVETICA;
use crate::export::pdf::write_pdf;

/// Target that holds the tailored text in the result view.
pub const DEFAULT_TARGET: &str = "pdf-content";
/// Every export downloads under this name.
pub const EXPORT_FILENAME: &str = "tailored-resume.pdf";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Render target '{0}' not found")]
    MissingTarget(String),

    #[error("An export of '{0}' is already in progress")]
    Busy(String),

    #[error("PDF encoding failed: {0}")]
    Encode(String),

    #[error("Render worker failed: {0}")]
    Worker(String),
}

/// Named blocks of text available for rendering, scoped to one owner
/// (a history entry or an unsaved result).
#[derive(Debug, Clone)]
pub struct RenderSurface {
    scope: String,
    targets: HashMap<String, String>,
}

impl RenderSurface {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            targets: HashMap::new(),
        }
    }

    pub fn mount(&mut self, target: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.targets.insert(target.into(), text.into());
        self
    }

    pub fn get(&self, target: &str) -> Option<&str> {
        self.targets.get(target).map(String::as_str)
    }

    fn busy_key(&self, target: &str) -> String {
        format!("{}#{}", self.scope, target)
    }
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Lays out and serializes `text` synchronously. CPU-bound; callers on the
/// async runtime go through `ExportRenderer::render`.
pub fn render_document(text: &str, setup: &PageSetup) -> Result<RenderedDocument, RenderError> {
    let pages = paginate(text, &HELVETICA, setup);
    let bytes = write_pdf(&pages, &HELVETICA, setup)?;
    Ok(RenderedDocument {
        filename: EXPORT_FILENAME,
        bytes,
        page_count: pages.len(),
    })
}

#[derive(Clone)]
pub struct ExportRenderer {
    setup: PageSetup,
    busy: Arc<Mutex<HashSet<String>>>,
}

impl ExportRenderer {
    pub fn new(setup: PageSetup) -> Self {
        Self {
            setup,
            busy: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Renders the text mounted at `selector` on `surface`.
    ///
    /// Fails with `MissingTarget` before taking the busy flag, and with `Busy`
    /// while another export of the same target is running.
    pub async fn render(
        &self,
        surface: &RenderSurface,
        selector: &str,
    ) -> Result<RenderedDocument, RenderError> {
        let text = surface
            .get(selector)
            .ok_or_else(|| RenderError::MissingTarget(selector.to_string()))?
            .to_string();
        let _guard = self.acquire(surface.busy_key(selector))?;

        let setup = self.setup.clone();
        let rendered = tokio::task::spawn_blocking(move || render_document(&text, &setup))
            .await
            .map_err(|e| RenderError::Worker(e.to_string()))??;

        info!(
            render_target = selector,
            pages = rendered.page_count,
            bytes = rendered.bytes.len(),
            "Rendered export"
        );
        Ok(rendered)
    }

    pub fn is_busy(&self, surface: &RenderSurface, selector: &str) -> bool {
        self.busy_set().contains(&surface.busy_key(selector))
    }

    fn busy_set(&self) -> MutexGuard<'_, HashSet<String>> {
        self.busy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, key: String) -> Result<BusyGuard, RenderError> {
        if !self.busy_set().insert(key.clone()) {
            return Err(RenderError::Busy(key));
        }
        Ok(BusyGuard {
            busy: self.busy.clone(),
            key,
        })
    }
}

/// Clears the busy flag on drop, including when the render future is dropped.
struct BusyGuard {
    busy: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(text: &str) -> RenderSurface {
        let mut surface = RenderSurface::new("entry-1");
        surface.mount(DEFAULT_TARGET, text);
        surface
    }

    #[test]
    fn test_render_document_produces_pdf() {
        let rendered = render_document("Jane Doe\nRust Engineer", &default_page_setup()).unwrap();
        assert_eq!(rendered.filename, "tailored-resume.pdf");
        assert_eq!(rendered.page_count, 1);
        assert!(rendered.bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_empty_text_still_renders_one_page() {
        let rendered = render_document("", &default_page_setup()).unwrap();
        assert_eq!(rendered.page_count, 1);
    }

    #[tokio::test]
    async fn test_missing_target_fails_and_stays_idle() {
        let renderer = ExportRenderer::new(default_page_setup());
        let surface = surface("Resume");

        let err = renderer.render(&surface, "no-such-target").await.unwrap_err();
        assert!(matches!(err, RenderError::MissingTarget(ref t) if t == "no-such-target"));
        assert!(!renderer.is_busy(&surface, "no-such-target"));
        assert!(!renderer.is_busy(&surface, DEFAULT_TARGET));
    }

    #[tokio::test]
    async fn test_render_returns_to_idle() {
        let renderer = ExportRenderer::new(default_page_setup());
        let surface = surface("Resume");

        let rendered = renderer.render(&surface, DEFAULT_TARGET).await.unwrap();
        assert_eq!(rendered.page_count, 1);
        assert!(!renderer.is_busy(&surface, DEFAULT_TARGET));
    }

    #[tokio::test]
    async fn test_overlapping_export_is_rejected() {
        let renderer = ExportRenderer::new(default_page_setup());
        let surface = surface("Resume");

        let guard = renderer.acquire(surface.busy_key(DEFAULT_TARGET)).unwrap();
        let err = renderer.render(&surface, DEFAULT_TARGET).await.unwrap_err();
        assert!(matches!(err, RenderError::Busy(_)));

        drop(guard);
        assert!(renderer.render(&surface, DEFAULT_TARGET).await.is_ok());
    }

    #[tokio::test]
    async fn test_busy_flag_is_per_scope() {
        let renderer = ExportRenderer::new(default_page_setup());
        let first = surface("One");
        let mut second = RenderSurface::new("entry-2");
        second.mount(DEFAULT_TARGET, "Two");

        let _guard = renderer.acquire(first.busy_key(DEFAULT_TARGET)).unwrap();
        assert!(renderer.is_busy(&first, DEFAULT_TARGET));
        assert!(renderer.render(&second, DEFAULT_TARGET).await.is_ok());
    }
}

//! PDF text extraction via `pdf-extract`.

use std::panic::{self, AssertUnwindSafe};

use tracing::debug;

use crate::extract::{DocumentKind, ExtractError};

/// Conforming readers accept the header anywhere in the first 1024 bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Extracts text page by page, in ascending page order.
///
/// Tokens on a page are joined with single spaces; pages are joined with `\n`.
/// A page with no text contributes an empty line.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if !window.windows(5).any(|w| w == b"%PDF-") {
        return Err(ExtractError::extraction(
            DocumentKind::Pdf,
            "missing %PDF header",
        ));
    }

    // pdf-extract panics on some malformed streams instead of returning an error.
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::extraction(DocumentKind::Pdf, "parser aborted on malformed input"))?
    .map_err(|e| ExtractError::extraction(DocumentKind::Pdf, e.to_string()))?;

    debug!(pages = pages.len(), "Extracted PDF text");
    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|page| page.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

//! Text Extractor: converts an uploaded document into plain text.
//!
//! Classification is by declared media type, falling back to the filename
//! extension when the media type is missing or generic. PDF and DOCX parsing
//! is CPU-bound and runs inside `tokio::task::spawn_blocking`.

pub mod docx;
pub mod handlers;
pub mod pdf;

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

/// Media types that say nothing about the actual format.
const GENERIC_MEDIA_TYPES: &[&str] = &[
    "application/octet-stream",
    "binary/octet-stream",
    "application/unknown",
    "application/x-unknown",
];

const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    PlainText,
    Pdf,
    WordDocument,
    Unsupported,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DocumentKind::PlainText => "plain text",
            DocumentKind::Pdf => "PDF",
            DocumentKind::WordDocument => "Word",
            DocumentKind::Unsupported => "unsupported",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from {format} document: {reason}")]
    Extraction { format: DocumentKind, reason: String },
}

impl ExtractError {
    pub fn extraction(format: DocumentKind, reason: impl Into<String>) -> Self {
        ExtractError::Extraction {
            format,
            reason: reason.into(),
        }
    }
}

/// An uploaded file as received. Consumed once by `extract`.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub bytes: Bytes,
    pub media_type: Option<String>,
    pub filename: Option<String>,
}

impl RawDocument {
    pub fn kind(&self) -> DocumentKind {
        classify(self.media_type.as_deref(), self.filename.as_deref())
    }

    /// The most specific label the caller gave us, for error messages.
    fn declared_type(&self) -> String {
        let media_type = self
            .media_type
            .as_deref()
            .map(normalize_media_type)
            .filter(|m| !m.is_empty() && !GENERIC_MEDIA_TYPES.contains(&m.as_str()));
        media_type
            .or_else(|| self.filename.as_deref().and_then(extension))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub format: DocumentKind,
}

/// Classifies an upload by media type, then by filename extension.
///
/// A specific but unrecognised media type is `Unsupported` regardless of the
/// extension; the extension is only consulted when the media type is absent
/// or generic.
pub fn classify(media_type: Option<&str>, filename: Option<&str>) -> DocumentKind {
    if let Some(media_type) = media_type.map(normalize_media_type) {
        if !media_type.is_empty() && !GENERIC_MEDIA_TYPES.contains(&media_type.as_str()) {
            return match media_type.as_str() {
                "text/plain" => DocumentKind::PlainText,
                "application/pdf" | "application/x-pdf" => DocumentKind::Pdf,
                DOCX_MEDIA_TYPE => DocumentKind::WordDocument,
                _ => DocumentKind::Unsupported,
            };
        }
    }

    match filename.and_then(extension).as_deref() {
        Some("txt") => DocumentKind::PlainText,
        Some("pdf") => DocumentKind::Pdf,
        Some("docx") => DocumentKind::WordDocument,
        _ => DocumentKind::Unsupported,
    }
}

/// Extracts the full text of a document, or fails without partial output.
pub fn extract(document: &RawDocument) -> Result<ExtractedText, ExtractError> {
    let format = document.kind();
    let text = match format {
        DocumentKind::PlainText => String::from_utf8_lossy(&document.bytes).into_owned(),
        DocumentKind::Pdf => pdf::extract_pdf_text(&document.bytes)?,
        DocumentKind::WordDocument => docx::extract_docx_text(&document.bytes)?,
        DocumentKind::Unsupported => {
            return Err(ExtractError::UnsupportedFormat(document.declared_type()))
        }
    };
    Ok(ExtractedText { text, format })
}

/// Async entry point: binary formats are parsed on the blocking pool.
pub async fn extract_document(document: RawDocument) -> Result<ExtractedText, ExtractError> {
    let format = document.kind();
    match format {
        DocumentKind::Pdf | DocumentKind::WordDocument => {
            tokio::task::spawn_blocking(move || extract(&document))
                .await
                .map_err(|e| {
                    ExtractError::extraction(format, format!("extraction worker failed: {e}"))
                })?
        }
        DocumentKind::PlainText | DocumentKind::Unsupported => extract(&document),
    }
}

fn normalize_media_type(raw: &str) -> String {
    raw.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.trim().rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use crate::errors::AppError;
use crate::extract::{extract_document, ExtractedText, RawDocument};

const FILE_FIELD: &str = "file";

/// POST /api/v1/extract
///
/// Accepts exactly one `file` part and returns its plain text.
pub async fn handle_extract(mut multipart: Multipart) -> Result<Json<ExtractedText>, AppError> {
    let mut document: Option<RawDocument> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error("Invalid multipart body", e))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if document.is_some() {
            return Err(AppError::Validation(
                "Only one file may be uploaded per request".to_string(),
            ));
        }

        let media_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error("Failed to read upload", e))?;

        document = Some(RawDocument {
            bytes,
            media_type,
            filename,
        });
    }

    let document = document
        .ok_or_else(|| AppError::Validation(format!("Missing '{FILE_FIELD}' part")))?;
    let size = document.bytes.len();

    let extracted = extract_document(document).await?;
    info!(
        format = %extracted.format,
        bytes = size,
        chars = extracted.text.chars().count(),
        "Extracted uploaded document"
    );

    Ok(Json(extracted))
}

/// Body-limit rejections surface while the stream is read, as multipart errors.
fn upload_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!("{context}: upload exceeds the size limit"))
    } else {
        AppError::Validation(format!("{context}: {e}"))
    }
}

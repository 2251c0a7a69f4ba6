//! Word (`.docx`) extraction: unzip the package, walk `word/document.xml`.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::extract::{DocumentKind, ExtractError};

const DOCUMENT_PART: &str = "word/document.xml";

pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ExtractError::extraction(
            DocumentKind::WordDocument,
            format!("not a valid package: {e}"),
        )
    })?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| {
            ExtractError::extraction(
                DocumentKind::WordDocument,
                format!("missing {DOCUMENT_PART}: {e}"),
            )
        })?
        .read_to_string(&mut xml)
        .map_err(|e| {
            ExtractError::extraction(
                DocumentKind::WordDocument,
                format!("unreadable {DOCUMENT_PART}: {e}"),
            )
        })?;

    document_xml_to_text(&xml)
}

/// Collects the raw text of `<w:t>` runs. Paragraphs and breaks become
/// newlines, tabs stay tabs; every other element (styling, drawings,
/// embedded objects) is dropped.
fn document_xml_to_text(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_run_text = true;
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" | b"p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(e)) if in_run_text => {
                let chunk = e.unescape().map_err(|err| {
                    ExtractError::extraction(DocumentKind::WordDocument, err.to_string())
                })?;
                text.push_str(&chunk);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::extraction(
                    DocumentKind::WordDocument,
                    format!(
                        "malformed document XML at byte {}: {e}",
                        reader.buffer_position()
                    ),
                ))
            }
            _ => {}
        }
    }

    Ok(text.trim_end_matches('\n').to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn package(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Title"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>Jane Doe</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Rust </w:t></w:r><w:r><w:t>&amp; Go</w:t></w:r></w:p>
    <w:p><w:r><w:drawing><wp:inline xmlns:wp="http://example.com/wp"/></w:drawing></w:r></w:p>
    <w:p><w:r><w:t>Skills</w:t><w:tab/><w:t>Tokio</w:t><w:br/><w:t>Axum</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_extracts_paragraph_text() {
        let bytes = package(&[
            ("[Content_Types].xml", "<Types/>"),
            (DOCUMENT_PART, DOCUMENT),
        ]);
        let text = extract_docx_text(&bytes).unwrap();
        assert_eq!(text, "Jane Doe\nRust & Go\n\nSkills\tTokio\nAxum");
    }

    #[test]
    fn test_ignores_whitespace_between_elements() {
        let xml = "<w:document><w:body>\n  <w:p><w:r><w:t>Hello World</w:t></w:r></w:p>\n</w:body></w:document>";
        assert_eq!(document_xml_to_text(xml).unwrap(), "Hello World");
    }

    #[test]
    fn test_missing_document_part_is_error() {
        let bytes = package(&[("word/styles.xml", "<w:styles/>")]);
        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(err.to_string().contains(DOCUMENT_PART));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let bytes = package(&[(
            DOCUMENT_PART,
            "<w:document><w:body><w:p><w:t>oops</w:p></w:body></w:document>",
        )]);
        let err = extract_docx_text(&bytes).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Extraction {
                format: DocumentKind::WordDocument,
                ..
            }
        ));
    }

    #[test]
    fn test_not_a_zip_is_error() {
        let err = extract_docx_text(b"plain bytes").unwrap_err();
        assert!(err.to_string().contains("not a valid package"));
    }
}

//! PDF serialization of laid-out pages via `lopdf`.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

use crate::export::layout::PageLayout;
use crate::export::metrics::{FontMetricTable, PageSetup};
use crate::export::RenderError;

const FONT_RESOURCE: &str = "F1";

/// Writes one PDF page per layout, using the standard base font with
/// WinAnsi encoding.
pub fn write_pdf(
    pages: &[PageLayout],
    metrics: &FontMetricTable,
    setup: &PageSetup,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => metrics.base_font,
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FONT_RESOURCE => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let content = page_content(page, setup);
        let encoded = content
            .encode()
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(setup.page_width_pt),
            Object::Real(setup.page_height_pt),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(bytes)
}

fn page_content(page: &PageLayout, setup: &PageSetup) -> Content {
    let mut operations = Vec::with_capacity(page.lines.len() * 2 + 3);
    operations.push(Operation::new("BT", vec![]));
    operations.push(Operation::new(
        "Tf",
        vec![FONT_RESOURCE.into(), Object::Real(setup.font_size_pt)],
    ));

    for line in page.lines.iter().filter(|l| !l.text.is_empty()) {
        operations.push(Operation::new(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                Object::Real(line.x_pt),
                Object::Real(line.y_pt),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(&line.text), StringFormat::Literal)],
        ));
    }

    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

/// Maps text to WinAnsi (CP1252) bytes. Characters with no code become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{A0}'..='\u{FF}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::layout::paginate;
    use crate::export::metrics::{default_page_setup, HELVETICA};

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(encode_win_ansi("Rust (2021)"), b"Rust (2021)".to_vec());
    }

    #[test]
    fn test_typographic_punctuation_maps_to_win_ansi() {
        assert_eq!(
            encode_win_ansi("• – — “” … é"),
            vec![0x95, b' ', 0x96, b' ', 0x97, b' ', 0x93, 0x94, b' ', 0x85, b' ', 0xE9]
        );
    }

    #[test]
    fn test_unmapped_characters_become_question_marks() {
        assert_eq!(encode_win_ansi("日本 ✓"), b"?? ?".to_vec());
    }

    #[test]
    fn test_writes_one_pdf_page_per_layout() {
        let setup = default_page_setup();
        let body = vec!["line"; setup.lines_per_page() + 1].join("\n");
        let pages = paginate(&body, &HELVETICA, &setup);
        let bytes = write_pdf(&pages, &HELVETICA, &setup).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}

//! Greedy line wrapping and pagination on the oversampled device grid.

use crate::export::metrics::{FontMetricTable, PageSetup};

/// One line of text with its baseline origin in PDF points (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x_pt: f32,
    pub y_pt: f32,
}

#[derive(Debug, Clone, Default)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Wraps every source line to the text width. Blank source lines are kept as
/// empty lines; words wider than a full line are broken between characters.
pub fn wrap_text(text: &str, metrics: &FontMetricTable, max_width_em: f32) -> Vec<String> {
    let mut out = Vec::new();

    for source_line in text.lines() {
        let words: Vec<&str> = source_line.split_whitespace().collect();
        if words.is_empty() {
            out.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in words {
            for piece in break_word(word, metrics, max_width_em) {
                let piece_w = metrics.measure_str(&piece);
                if current.is_empty() {
                    current = piece;
                    current_width = piece_w;
                } else if current_width + metrics.space_width + piece_w > max_width_em {
                    out.push(std::mem::take(&mut current));
                    current = piece;
                    current_width = piece_w;
                } else {
                    current.push(' ');
                    current.push_str(&piece);
                    current_width += metrics.space_width + piece_w;
                }
            }
        }
        out.push(current);
    }
    out
}

/// Splits a word into chunks no wider than `max_width_em`. Each chunk holds at
/// least one character.
fn break_word(word: &str, metrics: &FontMetricTable, max_width_em: f32) -> Vec<String> {
    if metrics.measure_str(word) <= max_width_em {
        return vec![word.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut width = 0.0_f32;
    for c in word.chars() {
        let w = metrics.char_width(c);
        if !current.is_empty() && width + w > max_width_em {
            pieces.push(std::mem::take(&mut current));
            width = 0.0;
        }
        current.push(c);
        width += w;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}

/// Wraps `text` and distributes the lines over pages. Always returns at least
/// one page, possibly empty.
pub fn paginate(text: &str, metrics: &FontMetricTable, setup: &PageSetup) -> Vec<PageLayout> {
    let lines = wrap_text(text, metrics, setup.text_width_em());
    let per_page = setup.lines_per_page();
    let margin = setup.margin_pt();
    let advance = setup.line_advance_pt();
    // First baseline sits one font size below the top margin.
    let first_baseline = setup.snap_pt(setup.page_height_pt - margin - setup.font_size_pt);

    let mut pages: Vec<PageLayout> = lines
        .chunks(per_page)
        .map(|chunk| PageLayout {
            lines: chunk
                .iter()
                .enumerate()
                .map(|(i, text)| PlacedLine {
                    text: text.clone(),
                    x_pt: margin,
                    y_pt: setup.snap_pt(first_baseline - advance * i as f32),
                })
                .collect(),
        })
        .collect();

    if pages.is_empty() {
        pages.push(PageLayout::default());
    }
    pages
}

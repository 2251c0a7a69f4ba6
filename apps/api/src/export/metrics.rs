//! Page geometry and Helvetica glyph metrics for the export renderer.
//!
//! Widths are in em units (1/1000 of the AFM advance widths). The table covers
//! ASCII 0x20..=0x7E; index = (char as usize) - 32.

use serde::Serialize;

/// PostScript points per inch.
pub const POINTS_PER_INCH: f32 = 72.0;
/// CSS reference pixels per inch.
pub const PIXELS_PER_INCH: f32 = 96.0;
/// Scale of the positioning grid over the reference grid. Text stays vector;
/// only line positions are snapped to this grid, nothing is rasterized.
pub const RASTER_SCALE: f32 = 2.0;

// ────────────────────────────────────────────────────────────────────────────
// Page setup
// ────────────────────────────────────────────────────────────────────────────

/// Physical page and typography settings for one export.
#[derive(Debug, Clone, Serialize)]
pub struct PageSetup {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_in: f32,
    pub font_size_pt: f32,
    /// Line advance as a multiple of the font size.
    pub line_height_em: f32,
    /// Multiplier for the snapping grid (no pixels are produced).
    pub raster_scale: f32,
}

/// US Letter portrait, 0.5" margins, Helvetica 11pt at 1.4em leading, positions snapped
/// to a 2x grid.
pub fn default_page_setup() -> PageSetup {
    PageSetup {
        page_width_pt: 612.0,
        page_height_pt: 792.0,
        margin_in: 0.5,
        font_size_pt: 11.0,
        line_height_em: 1.4,
        raster_scale: RASTER_SCALE,
    }
}

impl PageSetup {
    /// Grid units per point on the snapping grid (192 per inch at 2x).
    pub fn device_px_per_pt(&self) -> f32 {
        PIXELS_PER_INCH * self.raster_scale / POINTS_PER_INCH
    }

    /// Rounds a length in points onto the device grid and back.
    pub fn snap_pt(&self, pt: f32) -> f32 {
        let scale = self.device_px_per_pt();
        (pt * scale).round() / scale
    }

    pub fn margin_pt(&self) -> f32 {
        self.snap_pt(self.margin_in * POINTS_PER_INCH)
    }

    /// Usable text width in em units at the configured font size.
    pub fn text_width_em(&self) -> f32 {
        (self.page_width_pt - 2.0 * self.margin_pt()) / self.font_size_pt
    }

    /// Line advance in points, snapped to the device grid.
    pub fn line_advance_pt(&self) -> f32 {
        self.snap_pt(self.font_size_pt * self.line_height_em)
    }

    /// Whole lines that fit between the top and bottom margins. Never zero.
    pub fn lines_per_page(&self) -> usize {
        let usable = self.page_height_pt - 2.0 * self.margin_pt();
        ((usable / self.line_advance_pt()).floor() as usize).max(1)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Metric table
// ────────────────────────────────────────────────────────────────────────────

pub struct FontMetricTable {
    pub base_font: &'static str,
    widths: [f32; 95],
    /// Fallback width for characters outside the ASCII table.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    pub fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            self.widths[code - 32]
        } else {
            self.average_char_width
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }
}

/// Helvetica, the PDF standard font used for exports.
pub static HELVETICA: FontMetricTable = FontMetricTable {
    base_font: "Helvetica",
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

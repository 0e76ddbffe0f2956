//! Label text: measuring, the font-fit search and glyph painting

use image::{Rgba, RgbaImage};
use rusttype::{point, Font, PositionedGlyph, Scale};
use std::path::Path;
use thiserror::Error;

use super::canvas;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is not a usable TrueType font")]
    Invalid(String),
}

/// Measures the pixel bounding box of a string at a given size
pub trait TextMeasure: Send + Sync {
    /// (width, height) in pixels
    fn measure(&self, text: &str, size: f32) -> (f32, f32);
}

/// Metrics used when no font file is available
///
/// Assumes a glyph advance of 0.6 em and a line height of 1 em.
pub struct ApproxMetrics;

impl TextMeasure for ApproxMetrics {
    fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        let chars = text.chars().count() as f32;
        if chars == 0.0 {
            return (0.0, 0.0);
        }
        (chars * size * 0.6, size)
    }
}

/// A loaded TrueType face
pub struct GlyphFont {
    font: Font<'static>,
}

impl GlyphFont {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(data).ok_or_else(|| FontError::Invalid(path.display().to_string()))
    }

    pub fn from_bytes(data: Vec<u8>) -> Option<Self> {
        Font::try_from_vec(data).map(|font| Self { font })
    }

    fn layout(&self, text: &str, size: f32) -> Vec<PositionedGlyph<'_>> {
        let scale = Scale::uniform(size);
        let ascent = self.font.v_metrics(scale).ascent;
        self.font.layout(text, scale, point(0.0, ascent)).collect()
    }

    /// Paint `text` centred on (cx, cy)
    pub fn draw(&self, img: &mut RgbaImage, text: &str, size: f32, cx: i32, cy: i32, color: Rgba<u8>) {
        let glyphs = self.layout(text, size);
        let Some((min_x, min_y, max_x, max_y)) = bounds(&glyphs) else {
            return;
        };
        let offset_x = cx - (max_x - min_x) / 2;
        let offset_y = cy - (max_y - min_y) / 2;

        for glyph in &glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    let px = offset_x + gx as i32 + bb.min.x - min_x;
                    let py = offset_y + gy as i32 + bb.min.y - min_y;
                    canvas::blend(img, px, py, color, coverage);
                });
            }
        }
    }
}

impl TextMeasure for GlyphFont {
    fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        match bounds(&self.layout(text, size)) {
            Some((min_x, min_y, max_x, max_y)) => ((max_x - min_x) as f32, (max_y - min_y) as f32),
            None => (0.0, 0.0),
        }
    }
}

/// Union of the glyph pixel boxes as (min_x, min_y, max_x, max_y)
fn bounds(glyphs: &[PositionedGlyph<'_>]) -> Option<(i32, i32, i32, i32)> {
    glyphs
        .iter()
        .filter_map(|g| g.pixel_bounding_box())
        .fold(None, |acc, bb| {
            Some(match acc {
                None => (bb.min.x, bb.min.y, bb.max.x, bb.max.y),
                Some((min_x, min_y, max_x, max_y)) => (
                    min_x.min(bb.min.x),
                    min_y.min(bb.min.y),
                    max_x.max(bb.max.x),
                    max_y.max(bb.max.y),
                ),
            })
        })
}

/// Largest size, counting down from `start`, whose box fits `bound` x `bound`
///
/// Never goes below `min` (itself at least 1), so text that can never fit
/// still terminates.
pub fn fit_font_size(measure: &dyn TextMeasure, text: &str, start: u32, min: u32, bound: f32) -> u32 {
    let min = min.max(1);
    let mut size = start.max(min);
    loop {
        let (width, height) = measure.measure(text, size as f32);
        if (width <= bound && height <= bound) || size <= min {
            return size;
        }
        size -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_keeps_start_size() {
        assert_eq!(fit_font_size(&ApproxMetrics, "Mute", 16, 1, 80.0), 16);
    }

    #[test]
    fn test_long_text_shrinks_until_it_fits() {
        let text = "Reverb Send Level";
        let size = fit_font_size(&ApproxMetrics, text, 16, 1, 50.0);

        let (width, height) = ApproxMetrics.measure(text, size as f32);
        assert!(width <= 50.0 && height <= 50.0);
        let (wider, _) = ApproxMetrics.measure(text, (size + 1) as f32);
        assert!(wider > 50.0);
    }

    #[test]
    fn test_search_stops_at_minimum() {
        assert_eq!(fit_font_size(&ApproxMetrics, "anything", 16, 1, 0.0), 1);
        assert_eq!(fit_font_size(&ApproxMetrics, "anything", 16, 4, 0.0), 4);
        assert_eq!(fit_font_size(&ApproxMetrics, "anything", 16, 0, -5.0), 1);
    }

    #[test]
    fn test_empty_text_fits() {
        assert_eq!(ApproxMetrics.measure("", 16.0), (0.0, 0.0));
        assert_eq!(fit_font_size(&ApproxMetrics, "", 16, 1, 50.0), 16);
    }

    #[test]
    fn test_invalid_font_bytes() {
        assert!(GlyphFont::from_bytes(b"not a font".to_vec()).is_none());
        assert!(matches!(
            GlyphFont::load(Path::new("/definitely/missing.ttf")),
            Err(FontError::Io { .. })
        ));
    }
}

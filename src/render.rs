//! Feedback images for controls
//!
//! Buttons show a disc that lights up when the address is on, knobs show a
//! vertical bar filled to the address's position within its range. Both
//! overlay the control label, shrunk until it fits the canvas.

mod canvas;
mod palette;
mod text;

pub use palette::ControlColor;
pub use text::{fit_font_size, ApproxMetrics, FontError, GlyphFont, TextMeasure};

use image::{Rgba, RgbaImage};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;

/// Fonts tried when no font path is configured
const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

const RING_STROKE: f32 = 5.0;
const OUTLINE_STROKE: i32 = 3;

/// Host canvas size class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Slots up to 60 px
    Small,
    Large,
}

impl ImageSize {
    /// Side length of the square canvas
    pub fn dim(&self) -> u32 {
        match self {
            ImageSize::Small => 50,
            ImageSize::Large => 80,
        }
    }

    /// Size class for a host slot of `width` x `height` pixels
    pub fn for_slot(width: u32, height: u32) -> Self {
        if width.max(height) <= 60 {
            ImageSize::Small
        } else {
            ImageSize::Large
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Filled disc with a ring, used by buttons
    Arc,
    /// Bottom-anchored vertical bar, used by knobs
    Bar,
}

/// Everything needed to paint one control
#[derive(Debug, Clone)]
pub struct Feedback<'a> {
    pub shape: Shape,
    pub value: Decimal,
    pub min: Decimal,
    pub max: Decimal,
    pub color: ControlColor,
    pub label: &'a str,
}

/// Position of `current` in `min..max` as 0..100; an empty range is 0
///
/// Ranges too wide or too narrow for decimal arithmetic collapse to the end
/// `current` lies at.
pub fn percentage(current: Decimal, min: Decimal, max: Decimal) -> Decimal {
    let Some(span) = max.checked_sub(min) else {
        return Decimal::ZERO;
    };
    if span.is_zero() {
        return Decimal::ZERO;
    }
    let Some(offset) = current.checked_sub(min) else {
        return Decimal::ZERO;
    };

    offset
        .checked_div(span)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(if current > min {
            Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        })
}

/// Paints feedback images
///
/// Rendering reads nothing but its arguments, so identical feedback always
/// yields identical pixels.
pub struct FeedbackRenderer {
    font: Option<GlyphFont>,
    font_size: u32,
    min_font_size: u32,
}

impl FeedbackRenderer {
    pub fn new(font: Option<GlyphFont>, font_size: u32, min_font_size: u32) -> Self {
        Self {
            font,
            font_size,
            min_font_size: min_font_size.max(1),
        }
    }

    /// Build from engine settings, falling back to a system font
    ///
    /// Without any usable font labels are laid out but not painted.
    pub fn from_settings(settings: &EngineSettings) -> Self {
        let font = match &settings.font_path {
            Some(path) => match GlyphFont::load(path) {
                Ok(font) => {
                    info!("Loaded label font {}", path.display());
                    Some(font)
                },
                Err(e) => {
                    warn!("{}, trying system fonts", e);
                    system_font()
                },
            },
            None => system_font(),
        };
        if font.is_none() {
            warn!("No label font available, control labels will not be drawn");
        }
        Self::new(font, settings.font_size, settings.min_font_size)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn measure(&self) -> &dyn TextMeasure {
        match &self.font {
            Some(font) => font,
            None => &ApproxMetrics,
        }
    }

    /// Font size for `text` on a canvas of side `dim`
    pub fn label_size(&self, text: &str, dim: u32) -> u32 {
        fit_font_size(self.measure(), text, self.font_size, self.min_font_size, dim as f32)
    }

    pub fn render(&self, feedback: &Feedback<'_>, size: ImageSize) -> RgbaImage {
        let dim = size.dim();
        let mut img = RgbaImage::from_pixel(dim, dim, Rgba([0, 0, 0, 255]));

        let dim = dim as i32;
        let side = (dim as f32 * 0.6) as i32;
        let xc = dim / 2;
        let yc = (dim as f32 * 0.375) as i32;
        let bright = feedback.color.bright();
        let dark = feedback.color.dark();
        let font_size = self.label_size(feedback.label, dim as u32);

        match feedback.shape {
            Shape::Arc => {
                if feedback.value > Decimal::ZERO {
                    canvas::fill_circle(&mut img, xc, yc, side / 2, bright);
                }
                canvas::stroke_circle(&mut img, xc, yc, side / 2, RING_STROKE, dark);

                // Label box starts 0.6 em above the middle
                let top = dim / 2 - (font_size as f32 * 0.6).round() as i32;
                self.draw_text(&mut img, feedback.label, font_size, xc, top + dim / 2, bright);
            },
            Shape::Bar => {
                let pct = percentage(feedback.value, feedback.min, feedback.max)
                    .to_f32()
                    .unwrap_or(0.0);
                let filled = ((side as f32 * pct / 100.0) as i32).clamp(0, side);
                debug!("Bar at {}% ({} of {} px)", pct, filled, side);

                canvas::fill_rect(&mut img, xc - side / 2, yc + side / 2, side, -filled, dark);
                canvas::stroke_rect(&mut img, xc, yc, side, side, OUTLINE_STROKE, bright);

                let value = feedback.value.normalize().to_string();
                self.draw_text(&mut img, &value, font_size, xc, dim / 2, bright);

                let top = dim / 2 - font_size as i32 / 2;
                self.draw_text(&mut img, feedback.label, font_size, xc, top + dim / 2, bright);
            },
        }
        img
    }

    fn draw_text(&self, img: &mut RgbaImage, text: &str, size: u32, cx: i32, cy: i32, color: Rgba<u8>) {
        if text.is_empty() {
            return;
        }
        if let Some(font) = &self.font {
            font.draw(img, text, size as f32, cx, cy, color);
        }
    }
}

fn system_font() -> Option<GlyphFont> {
    FONT_CANDIDATES.iter().find_map(|candidate| {
        let path = Path::new(candidate);
        if !path.exists() {
            return None;
        }
        match GlyphFont::load(path) {
            Ok(font) => {
                info!("Using system font {}", path.display());
                Some(font)
            },
            Err(e) => {
                debug!("Skipping font candidate: {}", e);
                None
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn renderer() -> FeedbackRenderer {
        FeedbackRenderer::new(None, 16, 1)
    }

    fn feedback(shape: Shape, value: Decimal, min: Decimal, max: Decimal) -> Feedback<'static> {
        Feedback {
            shape,
            value,
            min,
            max,
            color: ControlColor::Green,
            label: "Mute",
        }
    }

    #[test]
    fn test_percentage_bounds() {
        assert_eq!(percentage(d("0"), d("0"), d("10")), d("0"));
        assert_eq!(percentage(d("10"), d("0"), d("10")), d("100"));
        assert_eq!(percentage(d("-5"), d("-10"), d("10")), d("25"));
    }

    #[test]
    fn test_percentage_empty_range_is_zero() {
        assert_eq!(percentage(d("3"), d("3"), d("3")), Decimal::ZERO);
        assert_eq!(percentage(d("7"), d("3"), d("3")), Decimal::ZERO);
    }

    #[test]
    fn test_percentage_out_of_decimal_range() {
        assert_eq!(percentage(d("1000000"), d("0"), d("0.0000000000000000000000001")), d("100"));
        assert_eq!(percentage(d("-1000000"), d("0"), d("0.0000000000000000000000001")), d("0"));
        assert_eq!(percentage(d("0"), Decimal::MIN, Decimal::MAX), d("0"));

        let img = renderer().render(
            &feedback(Shape::Bar, d("1000000"), d("0"), d("0.0000000000000000000000001")),
            ImageSize::Large,
        );
        assert_eq!(img.dimensions(), (80, 80));
    }

    #[test]
    fn test_size_classes() {
        assert_eq!(ImageSize::for_slot(60, 60), ImageSize::Small);
        assert_eq!(ImageSize::for_slot(90, 90), ImageSize::Large);
        assert_eq!(ImageSize::for_slot(116, 58), ImageSize::Large);

        let img = renderer().render(&feedback(Shape::Arc, d("0"), d("0"), d("1")), ImageSize::Large);
        assert_eq!(img.dimensions(), (80, 80));
    }

    #[test]
    fn test_arc_lights_up_when_on() {
        let r = renderer();
        // Small canvas: centre (25, 18), radius 15
        let on = r.render(&feedback(Shape::Arc, d("1"), d("0"), d("1")), ImageSize::Small);
        assert_eq!(*on.get_pixel(25, 18), ControlColor::Green.bright());
        assert_eq!(*on.get_pixel(40, 18), ControlColor::Green.dark());

        let off = r.render(&feedback(Shape::Arc, d("0"), d("0"), d("1")), ImageSize::Small);
        assert_eq!(*off.get_pixel(25, 18), BLACK);
        assert_eq!(*off.get_pixel(40, 18), ControlColor::Green.dark());
        assert_eq!(*off.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn test_bar_fills_from_the_bottom() {
        let r = renderer();
        // Small canvas: bar spans x 10..40, y 3..33
        let half = r.render(&feedback(Shape::Bar, d("50"), d("0"), d("100")), ImageSize::Small);
        assert_eq!(*half.get_pixel(25, 28), ControlColor::Green.dark());
        assert_eq!(*half.get_pixel(25, 12), BLACK);
        assert_eq!(*half.get_pixel(10, 18), ControlColor::Green.bright());

        let empty = r.render(&feedback(Shape::Bar, d("0"), d("0"), d("100")), ImageSize::Small);
        assert_eq!(*empty.get_pixel(25, 28), BLACK);
    }

    #[test]
    fn test_bar_fill_is_clamped() {
        let r = renderer();
        let over = r.render(&feedback(Shape::Bar, d("500"), d("0"), d("100")), ImageSize::Small);
        assert_eq!(*over.get_pixel(25, 0), BLACK);

        let flat = r.render(&feedback(Shape::Bar, d("4"), d("4"), d("4")), ImageSize::Small);
        assert_eq!(*flat.get_pixel(25, 28), BLACK);
    }

    #[test]
    fn test_label_size_search() {
        let r = renderer();
        assert_eq!(r.label_size("Mute", 50), 16);
        assert!(r.label_size("A much longer control label", 50) < 16);
        assert_eq!(FeedbackRenderer::new(None, 16, 0).label_size("x", 0), 1);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let r = FeedbackRenderer::from_settings(&EngineSettings::default());
        let fb = feedback(Shape::Bar, d("37.5"), d("0"), d("100"));
        assert_eq!(r.render(&fb, ImageSize::Large), r.render(&fb, ImageSize::Large));
    }
}

//! Pixel-level drawing primitives on an RGBA buffer
//!
//! Coordinates outside the image are clipped silently.

use image::{Rgba, RgbaImage};

/// Write a pixel if it lies inside the image
pub fn put(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Blend `color` over the existing pixel with coverage `alpha` (0..=1)
pub fn blend(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>, alpha: f32) {
    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
        return;
    }
    let alpha = alpha.clamp(0.0, 1.0);
    let dst = img.get_pixel_mut(x as u32, y as u32);
    for i in 0..3 {
        let mixed = color[i] as f32 * alpha + dst[i] as f32 * (1.0 - alpha);
        dst[i] = mixed.round() as u8;
    }
    dst[3] = 255;
}

/// Solid disc
pub fn fill_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, color: Rgba<u8>) {
    let r = radius as f32;
    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            if (dx * dx + dy * dy).sqrt() <= r {
                put(img, x, y, color);
            }
        }
    }
}

/// Circle outline of `stroke` pixels centred on `radius`
pub fn stroke_circle(img: &mut RgbaImage, cx: i32, cy: i32, radius: i32, stroke: f32, color: Rgba<u8>) {
    let half = stroke / 2.0;
    let reach = radius + half.ceil() as i32;
    for y in (cy - reach)..=(cy + reach) {
        for x in (cx - reach)..=(cx + reach) {
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            let distance = (dx * dx + dy * dy).sqrt();
            if (distance - radius as f32).abs() <= half {
                put(img, x, y, color);
            }
        }
    }
}

/// Axis-aligned filled rectangle; a negative height grows upwards from `y`
pub fn fill_rect(img: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: Rgba<u8>) {
    let (top, bottom) = if height < 0 { (y + height, y) } else { (y, y + height) };
    for py in top..bottom {
        for px in x..(x + width) {
            put(img, px, py, color);
        }
    }
}

/// Rectangle outline centred on (cx, cy), each side `stroke` pixels thick
pub fn stroke_rect(img: &mut RgbaImage, cx: i32, cy: i32, width: i32, height: i32, stroke: i32, color: Rgba<u8>) {
    let (width, height) = (width.abs(), height.abs());
    let left = cx - width / 2;
    let right = cx + width / 2;
    let top = cy - height / 2;
    let bottom = cy + height / 2;
    let half = stroke / 2;

    // Top and bottom
    fill_rect(img, left - half, top - half, width + stroke, stroke, color);
    fill_rect(img, left - half, bottom - half, width + stroke, stroke, color);
    // Left and right
    fill_rect(img, left - half, top - half, stroke, height + stroke, color);
    fill_rect(img, right - half, top - half, stroke, height + stroke, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    fn blank(dim: u32) -> RgbaImage {
        RgbaImage::from_pixel(dim, dim, BLACK)
    }

    #[test]
    fn test_fill_circle() {
        let mut img = blank(16);
        fill_circle(&mut img, 8, 8, 4, RED);
        assert_eq!(*img.get_pixel(8, 8), RED);
        assert_eq!(*img.get_pixel(8, 12), RED);
        assert_eq!(*img.get_pixel(0, 0), BLACK);
    }

    #[test]
    fn test_stroke_circle_leaves_centre_empty() {
        let mut img = blank(32);
        stroke_circle(&mut img, 16, 16, 10, 4.0, RED);
        assert_eq!(*img.get_pixel(16, 16), BLACK);
        assert_eq!(*img.get_pixel(26, 16), RED);
    }

    #[test]
    fn test_fill_rect_negative_height_grows_up() {
        let mut img = blank(10);
        fill_rect(&mut img, 2, 8, 3, -4, RED);
        assert_eq!(*img.get_pixel(2, 4), RED);
        assert_eq!(*img.get_pixel(4, 7), RED);
        assert_eq!(*img.get_pixel(2, 8), BLACK);
        assert_eq!(*img.get_pixel(2, 3), BLACK);
    }

    #[test]
    fn test_drawing_is_clipped() {
        let mut img = blank(4);
        fill_circle(&mut img, 0, 0, 10, RED);
        stroke_rect(&mut img, 2, 2, 20, 20, 3, RED);
        blend(&mut img, -1, 7, RED, 1.0);
        assert_eq!(*img.get_pixel(3, 3), RED);
    }

    #[test]
    fn test_blend_mixes_channels() {
        let mut img = blank(2);
        blend(&mut img, 0, 0, Rgba([200, 100, 0, 255]), 0.5);
        assert_eq!(*img.get_pixel(0, 0), Rgba([100, 50, 0, 255]));
    }
}

//! Textures drawn on the CPU instead of loaded from disk.
//!
//! They stand in for image assets that are missing and provide the ramp
//! used by toon shading.

use image::{Rgba, RgbaImage};

pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Vertical linear gradient from `top` (first row) to `bottom` (last row).
pub fn gradient(width: u32, height: u32, top: [u8; 4], bottom: [u8; 4]) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    let span = (height - 1).max(1) as f32;
    RgbaImage::from_fn(width, height, |_, y| {
        let t = y as f32 / span;
        let mut px = [0u8; 4];
        for c in 0..4 {
            let a = top[c] as f32;
            let b = bottom[c] as f32;
            px[c] = (a + (b - a) * t).round() as u8;
        }
        Rgba(px)
    })
}

/// `cells x cells` checkerboard over a `size x size` image, cell (0, 0) is `a`.
pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> RgbaImage {
    let size = size.max(1);
    let cells = cells.clamp(1, size);
    let cell = size as f32 / cells as f32;
    RgbaImage::from_fn(size, size, |x, y| {
        let cx = (x as f32 / cell) as u32;
        let cy = (y as f32 / cell) as u32;
        if (cx + cy) % 2 == 0 { Rgba(a) } else { Rgba(b) }
    })
}

/// `steps x 1` luminance ramp sampled with nearest filtering by the toon shader.
pub fn toon_gradient(steps: u32) -> RgbaImage {
    let steps = steps.max(2);
    RgbaImage::from_fn(steps, 1, |x, _| {
        let v = (x as f32 / (steps - 1) as f32 * 255.0).round() as u8;
        Rgba([v, v, v, 255])
    })
}

/// Radial shading ball used when no matcap image could be loaded.
pub fn matcap_ball(size: u32, lit: [u8; 4], shadow: [u8; 4]) -> RgbaImage {
    let size = size.max(2);
    let half = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        // light from the upper left
        let dx = (x as f32 + 0.5 - half * 0.7) / size as f32;
        let dy = (y as f32 + 0.5 - half * 0.7) / size as f32;
        let t = ((dx * dx + dy * dy).sqrt() * 1.4).clamp(0.0, 1.0);
        let mut px = [0u8; 4];
        for c in 0..4 {
            px[c] = (lit[c] as f32 + (shadow[c] as f32 - lit[c] as f32) * t).round() as u8;
        }
        Rgba(px)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gradient_should_interpolate_top_to_bottom() {
        let img = gradient(4, 5, WHITE, BLACK);
        assert_eq!(img.dimensions(), (4, 5));
        assert_eq!(img.get_pixel(0, 0).0, WHITE);
        assert_eq!(img.get_pixel(3, 4).0, BLACK);
        let mid = img.get_pixel(2, 2).0;
        assert!(mid[0] > 120 && mid[0] < 135, "unexpected mid value {:?}", mid);
        assert_eq!(mid[3], 255);
    }

    #[test]
    fn checkerboard_should_alternate_cells() {
        let img = checkerboard(8, 8, WHITE, BLACK);
        assert_eq!(img.get_pixel(0, 0).0, WHITE);
        assert_eq!(img.get_pixel(1, 0).0, BLACK);
        assert_eq!(img.get_pixel(0, 1).0, BLACK);
        assert_eq!(img.get_pixel(1, 1).0, WHITE);

        let img = checkerboard(1024, 2, WHITE, BLACK);
        assert_eq!(img.get_pixel(511, 511).0, WHITE);
        assert_eq!(img.get_pixel(512, 0).0, BLACK);
        assert_eq!(img.get_pixel(1023, 1023).0, WHITE);
    }

    #[test]
    fn toon_gradient_should_span_black_to_white() {
        let img = toon_gradient(3);
        assert_eq!(img.dimensions(), (3, 1));
        assert_eq!(img.get_pixel(0, 0).0, BLACK);
        assert_eq!(img.get_pixel(1, 0).0[0], 128);
        assert_eq!(img.get_pixel(2, 0).0, WHITE);
    }

    #[test]
    fn degenerate_sizes_still_produce_pixels() {
        assert_eq!(gradient(0, 0, WHITE, BLACK).dimensions(), (1, 1));
        assert_eq!(checkerboard(4, 0, WHITE, BLACK).get_pixel(3, 3).0, WHITE);
        assert_eq!(toon_gradient(0).dimensions(), (2, 1));
    }
}

//! Software rasterizer backed by [`image::RgbaImage`].
//!
//! Sprites are drawn by inverse mapping: every target pixel inside the
//! transformed quad's bounding box is pulled back into sprite space and
//! sampled with nearest-neighbour filtering. Lines are stamped along their
//! length with a square brush of the requested width. Both blend with
//! straight alpha over the existing pixels.

use image::{Rgba, RgbaImage};

use super::{Canvas, Color, Line};
use crate::math::{Affine2, Vec2};
use crate::sprite::{Sprite, SpriteHandle};

/// A [`Canvas`] that draws into an in-memory RGBA image.
#[derive(Debug, Clone)]
pub struct ImageCanvas {
    target: RgbaImage,
}

impl ImageCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            target: RgbaImage::new(width, height),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.target
    }

    pub fn into_image(self) -> RgbaImage {
        self.target
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.target.width() && y < self.target.height() {
            Some(self.target.get_pixel(x, y).0)
        } else {
            None
        }
    }

    fn blend(&mut self, x: i64, y: i64, src: [u8; 4]) {
        if x < 0 || y < 0 || x >= self.target.width() as i64 || y >= self.target.height() as i64 {
            return;
        }
        let dst = self.target.get_pixel_mut(x as u32, y as u32);
        let alpha = src[3] as f32 / 255.0;
        if alpha <= 0.0 {
            return;
        }
        for i in 0..3 {
            dst.0[i] = (src[i] as f32 * alpha + dst.0[i] as f32 * (1.0 - alpha)).round() as u8;
        }
        dst.0[3] = (src[3] as f32 + dst.0[3] as f32 * (1.0 - alpha)).round().min(255.0) as u8;
    }

    /// Pixel-space bounding box of `points`, clamped to the target.
    fn clamped_bounds(&self, points: &[Vec2]) -> Option<(i64, i64, i64, i64)> {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for p in points {
            min = min.min(*p);
            max = max.max(*p);
        }
        if !min.is_finite() || !max.is_finite() {
            return None;
        }
        let x0 = (min.x.floor() as i64).max(0);
        let y0 = (min.y.floor() as i64).max(0);
        let x1 = (max.x.ceil() as i64).min(self.target.width() as i64);
        let y1 = (max.y.ceil() as i64).min(self.target.height() as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

impl Canvas for ImageCanvas {
    fn clear(&mut self, color: Color) {
        let rgba = Rgba(color.to_rgba8());
        for pixel in self.target.pixels_mut() {
            *pixel = rgba;
        }
    }

    fn draw_sprite(&mut self, _handle: SpriteHandle, sprite: &Sprite, transform: Affine2, size: Vec2) {
        if size.x <= 0.0 || size.y <= 0.0 || sprite.width() == 0 || sprite.height() == 0 {
            return;
        }
        // A degenerate transform (zero scale) has no inverse and covers no pixels.
        if transform.matrix2.determinant().abs() < f32::EPSILON {
            return;
        }
        let corners = [
            transform.transform_point2(Vec2::ZERO),
            transform.transform_point2(Vec2::new(size.x, 0.0)),
            transform.transform_point2(size),
            transform.transform_point2(Vec2::new(0.0, size.y)),
        ];
        let Some((x0, y0, x1, y1)) = self.clamped_bounds(&corners) else {
            return;
        };

        let inverse = transform.inverse();
        let image = sprite.image();
        let (sw, sh) = (image.width() as f32, image.height() as f32);
        for y in y0..y1 {
            for x in x0..x1 {
                let local = inverse.transform_point2(Vec2::new(x as f32 + 0.5, y as f32 + 0.5));
                if local.x < 0.0 || local.y < 0.0 || local.x >= size.x || local.y >= size.y {
                    continue;
                }
                let u = ((local.x / size.x) * sw) as u32;
                let v = ((local.y / size.y) * sh) as u32;
                let texel = image.get_pixel(u.min(image.width() - 1), v.min(image.height() - 1)).0;
                self.blend(x, y, texel);
            }
        }
    }

    fn draw_line(&mut self, line: &Line) {
        if !line.from.is_finite() || !line.to.is_finite() {
            return;
        }
        let (w, h) = (self.target.width() as i64, self.target.height() as i64);
        let half = ((line.width.max(1.0) * 0.5) as i64).min(w.max(h));
        // Only the part of the segment whose brush can reach the target is walked.
        let pad = (half + 1) as f32;
        let lo = Vec2::splat(-pad);
        let hi = Vec2::new(w as f32 + pad, h as f32 + pad);
        let Some((from, to)) = clip_segment(line.from, line.to, lo, hi) else {
            return;
        };

        let color = line.color.to_rgba8();
        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as i64;
        let mut last = None;
        for i in 0..=steps {
            let p = from + delta * (i as f32 / steps as f32);
            let (px, py) = (p.x.floor() as i64, p.y.floor() as i64);
            // Consecutive samples can round onto the same pixel.
            if last == Some((px, py)) {
                continue;
            }
            last = Some((px, py));
            for y in (py - half).max(0)..=(py + half).min(h - 1) {
                for x in (px - half).max(0)..=(px + half).min(w - 1) {
                    self.blend(x, y, color);
                }
            }
        }
    }
}

/// Liang-Barsky clip of the segment `from..to` to the box `lo..hi`.
fn clip_segment(from: Vec2, to: Vec2, lo: Vec2, hi: Vec2) -> Option<(Vec2, Vec2)> {
    let d = to - from;
    let (mut t0, mut t1) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-d.x, from.x - lo.x),
        (d.x, hi.x - from.x),
        (-d.y, from.y - lo.y),
        (d.y, hi.y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((from + d * t0, from + d * t1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render2d::draw_transform;
    use crate::sprite::SpriteStore;

    fn red_sprite(store: &mut SpriteStore) -> SpriteHandle {
        store.insert("red", RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn clear_fills_every_pixel() {
        let mut canvas = ImageCanvas::new(3, 2);
        canvas.clear(Color::BLUE);
        assert_eq!(canvas.pixel(2, 1), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(3, 0), None);
    }

    #[test]
    fn sprite_covers_its_rectangle() {
        let mut store = SpriteStore::new();
        let handle = red_sprite(&mut store);
        let mut canvas = ImageCanvas::new(20, 20);
        canvas.clear(Color::BLACK);

        let t = draw_transform(Vec2::new(5.0, 5.0), 0.0, Vec2::ONE, Vec2::ZERO);
        canvas.draw_sprite(handle, store.sprite(handle).unwrap(), t, Vec2::new(8.0, 8.0));

        assert_eq!(canvas.pixel(5, 5), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(12, 12), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(13, 13), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(4, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn body_offset_centres_sprite_on_position() {
        let mut store = SpriteStore::new();
        let handle = red_sprite(&mut store);
        let mut canvas = ImageCanvas::new(20, 20);
        canvas.clear(Color::BLACK);

        let t = draw_transform(Vec2::new(10.0, 10.0), 0.0, Vec2::ONE, Vec2::new(6.0, 6.0));
        canvas.draw_sprite(handle, store.sprite(handle).unwrap(), t, Vec2::new(6.0, 6.0));

        assert_eq!(canvas.pixel(7, 7), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(12, 12), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(6, 6), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(13, 13), Some([0, 0, 0, 255]));
    }

    #[test]
    fn zero_scale_draws_nothing() {
        let mut store = SpriteStore::new();
        let handle = red_sprite(&mut store);
        let mut canvas = ImageCanvas::new(8, 8);
        canvas.clear(Color::BLACK);
        let t = draw_transform(Vec2::new(2.0, 2.0), 0.0, Vec2::ZERO, Vec2::ZERO);
        canvas.draw_sprite(handle, store.sprite(handle).unwrap(), t, Vec2::new(4.0, 4.0));
        assert!(canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn horizontal_line_is_stamped() {
        let mut canvas = ImageCanvas::new(10, 5);
        canvas.clear(Color::BLACK);
        canvas.draw_line(&Line::new(1.0, 2.0, 8.0, 2.0, Color::WHITE, 1.0));
        for x in 1..=8 {
            assert_eq!(canvas.pixel(x, 2), Some([255, 255, 255, 255]), "x = {x}");
        }
        assert_eq!(canvas.pixel(1, 3), Some([0, 0, 0, 255]));
    }

    #[test]
    fn very_long_line_is_clipped_to_the_target() {
        let mut canvas = ImageCanvas::new(10, 10);
        canvas.clear(Color::BLACK);
        canvas.draw_line(&Line::new(0.0, 4.0, 2.0e8, 4.0, Color::WHITE, 1.0));
        for x in 0..10 {
            assert_eq!(canvas.pixel(x, 4), Some([255, 255, 255, 255]), "x = {x}");
        }
        assert_eq!(canvas.pixel(0, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn off_target_and_non_finite_lines_draw_nothing() {
        let mut canvas = ImageCanvas::new(10, 10);
        canvas.clear(Color::BLACK);
        canvas.draw_line(&Line::new(-50.0, -50.0, -20.0, -5.0, Color::WHITE, 3.0));
        canvas.draw_line(&Line::new(0.0, 0.0, f32::INFINITY, 5.0, Color::WHITE, 1.0));
        canvas.draw_line(&Line::new(f32::NAN, 0.0, 5.0, 5.0, Color::WHITE, 1.0));
        assert!(canvas.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn oversized_brush_is_capped_to_the_target() {
        let mut canvas = ImageCanvas::new(6, 4);
        canvas.clear(Color::BLACK);
        canvas.draw_line(&Line::new(3.0, 2.0, 3.0, 2.0, Color::WHITE, f32::INFINITY));
        assert!(canvas.image().pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }
}

//! Minimal rasterizer
//!
//! Shapes are given in world-up coordinates: the origin sits at the bottom
//! left corner and `y` grows upwards. The canvas flips them into image rows
//! when writing pixels. A pixel is covered when its centre lies inside the
//! shape.

use glam::Vec2;
use image::{Rgb, RgbImage};

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    /// Create a canvas filled with `background`.
    #[must_use]
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self { image: RgbImage::from_pixel(width, height, background) }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Convert a world-up point to image space (row 0 at the top).
    fn to_image_space(&self, p: Vec2) -> Vec2 {
        Vec2::new(p.x, self.height() as f32 - p.y)
    }

    /// Visit every pixel whose centre falls in the image-space box `[min, max]`.
    fn for_each_in_bounds(&mut self, min: Vec2, max: Vec2, mut cover: impl FnMut(Vec2) -> Option<Rgb<u8>>) {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let x0 = min.x.floor().clamp(0.0, w) as u32;
        let x1 = max.x.ceil().clamp(0.0, w) as u32;
        let y0 = min.y.floor().clamp(0.0, h) as u32;
        let y1 = max.y.ceil().clamp(0.0, h) as u32;
        for y in y0..y1 {
            for x in x0..x1 {
                let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if let Some(color) = cover(centre) {
                    self.image.put_pixel(x, y, color);
                }
            }
        }
    }

    /// Fill a convex polygon. Vertices may wind either way.
    pub fn fill_convex_polygon(&mut self, vertices: &[Vec2], color: Rgb<u8>) {
        if vertices.len() < 3 {
            return;
        }
        let pts: Vec<Vec2> = vertices.iter().map(|&v| self.to_image_space(v)).collect();
        let min = pts.iter().copied().fold(Vec2::splat(f32::INFINITY), Vec2::min);
        let max = pts.iter().copied().fold(Vec2::splat(f32::NEG_INFINITY), Vec2::max);

        self.for_each_in_bounds(min, max, |p| {
            let mut sign = 0.0_f32;
            for (i, &a) in pts.iter().enumerate() {
                let b = pts[(i + 1) % pts.len()];
                let cross = (b - a).perp_dot(p - a);
                if cross == 0.0 {
                    continue;
                }
                if sign == 0.0 {
                    sign = cross.signum();
                } else if cross.signum() != sign {
                    return None;
                }
            }
            Some(color)
        });
    }

    /// Fill an axis-aligned rectangle spanning `[left, right] x [bottom, top]`.
    pub fn fill_rect(&mut self, left: f32, right: f32, bottom: f32, top: f32, color: Rgb<u8>) {
        self.fill_convex_polygon(
            &[
                Vec2::new(left, bottom),
                Vec2::new(left, top),
                Vec2::new(right, top),
                Vec2::new(right, bottom),
            ],
            color,
        );
    }

    pub fn fill_circle(&mut self, centre: Vec2, radius: f32, color: Rgb<u8>) {
        let c = self.to_image_space(centre);
        let r2 = radius * radius;
        self.for_each_in_bounds(c - radius, c + radius, |p| (p.distance_squared(c) <= r2).then_some(color));
    }

    /// Draw a one pixel high line across the whole width at height `y`.
    pub fn hline(&mut self, y: f32, color: Rgb<u8>) {
        let row = self.height() as f32 - y;
        if row < 0.0 || row >= self.height() as f32 {
            return;
        }
        let row = row as u32;
        for x in 0..self.width() {
            self.image.put_pixel(x, row, color);
        }
    }

    #[must_use]
    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
    const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn rect_is_flipped_into_image_rows() {
        let mut canvas = Canvas::new(10, 10, WHITE);
        canvas.fill_rect(2.0, 4.0, 0.0, 2.0, BLACK);
        let img = canvas.into_image();
        assert_eq!(*img.get_pixel(2, 9), BLACK);
        assert_eq!(*img.get_pixel(3, 8), BLACK);
        assert_eq!(*img.get_pixel(2, 7), WHITE);
        assert_eq!(*img.get_pixel(4, 9), WHITE);
    }

    #[test]
    fn shapes_outside_are_clipped() {
        let mut canvas = Canvas::new(4, 4, WHITE);
        canvas.fill_rect(-10.0, -5.0, -10.0, -5.0, BLACK);
        canvas.fill_circle(Vec2::new(100.0, 100.0), 3.0, BLACK);
        canvas.hline(50.0, BLACK);
        assert!(canvas.into_image().pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn circle_covers_centre() {
        let mut canvas = Canvas::new(9, 9, WHITE);
        canvas.fill_circle(Vec2::new(4.5, 4.5), 2.0, BLACK);
        let img = canvas.into_image();
        assert_eq!(*img.get_pixel(4, 4), BLACK);
        assert_eq!(*img.get_pixel(0, 0), WHITE);
    }
}

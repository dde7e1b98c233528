use image::{Rgb, RgbImage};

use crate::analysis::shift::ShiftHit;

#[derive(Debug, Clone)]
pub struct AnnotationConfig {
    pub arrow_color: Rgb<u8>,
    pub label_fill: Rgb<u8>,
    pub label_text: Rgb<u8>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            arrow_color: Rgb([255, 0, 0]),
            label_fill: Rgb([0, 255, 0]),
            label_text: Rgb([0, 0, 0]),
        }
    }
}

/// Draws ranked hits onto a copy of the inspected image: an arrow from
/// the cluster's source centroid along the shift, plus a filled label
/// box carrying the ranking index.
pub struct Annotator {
    config: AnnotationConfig,
}

impl Annotator {
    pub fn new() -> Self {
        Self {
            config: AnnotationConfig::default(),
        }
    }

    pub fn with_config(config: AnnotationConfig) -> Self {
        Self { config }
    }

    pub fn mark_hits(&self, original: &RgbImage, hits: &[ShiftHit]) -> RgbImage {
        let mut canvas = original.clone();

        for hit in hits {
            let centroid = hit.centroid();
            let half = hit.block_size() as i32 / 2;
            let x = centroid.x as i32 + half;
            let y = centroid.y as i32 + half;

            self.draw_line(&mut canvas, x, y, x + hit.dx(), y + hit.dy());
            self.draw_label(&mut canvas, x, y, hit.ranking());
        }

        canvas
    }

    fn draw_line(&self, image: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32) {
        let (width, height) = image.dimensions();

        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1i32 } else { -1i32 };
        let sy = if y0 < y1 { 1i32 } else { -1i32 };
        let mut err = dx + dy;

        let mut x = x0;
        let mut y = y0;

        loop {
            if x >= 0 && x < width as i32 && y >= 0 && y < height as i32 {
                image.put_pixel(x as u32, y as u32, self.config.arrow_color);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn draw_label(&self, image: &mut RgbImage, x: i32, y: i32, ranking: usize) {
        let text = ranking.to_string();
        let box_w = 8 + text.len() as i32 * 8;

        self.fill_rect(image, x - 5, y - 10, box_w, 20, self.config.label_fill);

        for (i, c) in text.chars().enumerate() {
            if let Some(digit) = c.to_digit(10) {
                self.draw_digit(image, x - 1 + i as i32 * 8, y - 5, digit as usize);
            }
        }
    }

    fn fill_rect(&self, image: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb<u8>) {
        let (width, height) = image.dimensions();

        for yy in y..y + h {
            for xx in x..x + w {
                if xx >= 0 && xx < width as i32 && yy >= 0 && yy < height as i32 {
                    image.put_pixel(xx as u32, yy as u32, color);
                }
            }
        }
    }

    fn draw_digit(&self, image: &mut RgbImage, x: i32, y: i32, digit: usize) {
        // 3×5 glyphs, one row per bitmask line.
        const GLYPHS: [[u8; 5]; 10] = [
            [0b111, 0b101, 0b101, 0b101, 0b111], // 0
            [0b010, 0b110, 0b010, 0b010, 0b111], // 1
            [0b111, 0b001, 0b111, 0b100, 0b111], // 2
            [0b111, 0b001, 0b111, 0b001, 0b111], // 3
            [0b101, 0b101, 0b111, 0b001, 0b001], // 4
            [0b111, 0b100, 0b111, 0b001, 0b111], // 5
            [0b111, 0b100, 0b111, 0b101, 0b111], // 6
            [0b111, 0b001, 0b010, 0b010, 0b010], // 7
            [0b111, 0b101, 0b111, 0b101, 0b111], // 8
            [0b111, 0b101, 0b111, 0b001, 0b111], // 9
        ];

        let (width, height) = image.dimensions();
        for (row, bits) in GLYPHS[digit].iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                let px = x + col as i32 * 2;
                let py = y + row as i32 * 2;
                for dy in 0..2 {
                    for dx in 0..2 {
                        let (gx, gy) = (px + dx, py + dy);
                        if gx >= 0 && gx < width as i32 && gy >= 0 && gy < height as i32 {
                            image.put_pixel(gx as u32, gy as u32, self.config.label_text);
                        }
                    }
                }
            }
        }
    }
}

impl Default for Annotator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::shift::{Point, Shift};

    fn hit(dx: i32, dy: i32, pairs: Vec<(Point, Point)>) -> ShiftHit {
        let mut hit = ShiftHit::new(Shift::quantized(dx, dy, 1), (128, 128), 1, 16);
        hit.set_pairs(pairs);
        hit
    }

    #[test]
    fn marks_arrow_and_label() {
        let base = RgbImage::new(128, 128);
        let hits = vec![hit(
            40,
            40,
            vec![(Point::new(20, 20), Point::new(60, 60))],
        )];

        let marked = Annotator::new().mark_hits(&base, &hits);
        assert_eq!(marked.dimensions(), base.dimensions());
        // Arrow midpoint: centroid (20,20) + half block (8,8), halfway along (40,40).
        assert_eq!(*marked.get_pixel(48, 48), Rgb([255, 0, 0]));
        // Label box around the arrow origin.
        assert_eq!(*marked.get_pixel(24, 20), Rgb([0, 255, 0]));
    }

    #[test]
    fn clips_at_image_border() {
        let base = RgbImage::new(32, 32);
        let hits = vec![hit(
            60,
            0,
            vec![(Point::new(0, 0), Point::new(60, 0))],
        )];

        // Arrow runs off the right edge; must not panic.
        let marked = Annotator::new().mark_hits(&base, &hits);
        assert_eq!(marked.dimensions(), (32, 32));
    }
}

//! Raster renderer producing PNG files.
//!
//! Edges are drawn with Xiaolin Wu anti-aliased lines, nodes and arrowheads
//! are filled with per-pixel coverage, and labels use a tiny bitmap font.

use crate::error::Result;
use crate::generators::palette::{self, Rgb};
use crate::generators::{Arrow, Canvas, Generator, Style};
use crate::orbit::Diagram;
use image::{ImageFormat, RgbImage};
use std::io::Cursor;

pub struct PngGenerator {
    pub canvas: Canvas,
}

impl Default for PngGenerator {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

/// Blend `color` over the pixel at `(x, y)` with the given coverage.
fn blend(img: &mut RgbImage, x: i64, y: i64, color: Rgb, alpha: f64) {
    if x < 0 || y < 0 || x >= img.width() as i64 || y >= img.height() as i64 || alpha <= 0.0 {
        return;
    }
    let alpha = alpha.min(1.0);
    let px = img.get_pixel_mut(x as u32, y as u32);
    for (channel, target) in px.0.iter_mut().zip([color.r, color.g, color.b]) {
        let mixed = *channel as f64 * (1.0 - alpha) + target as f64 * alpha;
        *channel = mixed.round() as u8;
    }
}

/// Xiaolin Wu's line algorithm.
fn draw_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), color: Rgb, alpha: f64) {
    let (mut x0, mut y0) = from;
    let (mut x1, mut y1) = to;
    let steep = (y1 - y0).abs() > (x1 - x0).abs();
    if steep {
        std::mem::swap(&mut x0, &mut y0);
        std::mem::swap(&mut x1, &mut y1);
    }
    if x0 > x1 {
        std::mem::swap(&mut x0, &mut x1);
        std::mem::swap(&mut y0, &mut y1);
    }

    let dx = x1 - x0;
    let gradient = if dx.abs() < f64::EPSILON {
        1.0
    } else {
        (y1 - y0) / dx
    };

    let mut plot = |x: i64, y: i64, c: f64| {
        if steep {
            blend(img, y, x, color, c * alpha);
        } else {
            blend(img, x, y, color, c * alpha);
        }
    };

    let x_start = x0.round() as i64;
    let x_end = x1.round() as i64;
    let mut intery = y0 + gradient * (x_start as f64 - x0);

    for x in x_start..=x_end {
        let base = intery.floor();
        let frac = intery - base;
        plot(x, base as i64, 1.0 - frac);
        plot(x, base as i64 + 1, frac);
        intery += gradient;
    }
}

/// A line `width` pixels wide, built from parallel one-pixel strokes.
fn draw_thick_line(img: &mut RgbImage, from: (f64, f64), to: (f64, f64), width: f64, color: Rgb) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    let len = (dx * dx + dy * dy).sqrt();
    if len < f64::EPSILON {
        return;
    }
    let (px, py) = (-dy / len, dx / len);

    let strokes = width.round().max(1.0) as i64;
    let alpha = (width / strokes as f64).min(1.0);
    for i in 0..strokes {
        let offset = i as f64 - (strokes - 1) as f64 / 2.0;
        let shift = (px * offset, py * offset);
        draw_line(
            img,
            (from.0 + shift.0, from.1 + shift.1),
            (to.0 + shift.0, to.1 + shift.1),
            color,
            alpha,
        );
    }
}

fn fill_disc(img: &mut RgbImage, center: (f64, f64), radius: f64, color: Rgb) {
    let (cx, cy) = center;
    let x_min = (cx - radius - 1.0).floor() as i64;
    let x_max = (cx + radius + 1.0).ceil() as i64;
    let y_min = (cy - radius - 1.0).floor() as i64;
    let y_max = (cy + radius + 1.0).ceil() as i64;

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let dx = x as f64 + 0.5 - cx;
            let dy = y as f64 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            blend(img, x, y, color, (radius + 0.5 - dist).clamp(0.0, 1.0));
        }
    }
}

fn fill_triangle(img: &mut RgbImage, corners: [(f64, f64); 3], color: Rgb) {
    let [a, b, c] = corners;
    let edge = |p: (f64, f64), q: (f64, f64), r: (f64, f64)| {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    };
    let area = edge(a, b, c);
    if area.abs() < f64::EPSILON {
        return;
    }

    let x_min = a.0.min(b.0).min(c.0).floor() as i64;
    let x_max = a.0.max(b.0).max(c.0).ceil() as i64;
    let y_min = a.1.min(b.1).min(c.1).floor() as i64;
    let y_max = a.1.max(b.1).max(c.1).ceil() as i64;

    for y in y_min..=y_max {
        for x in x_min..=x_max {
            let p = (x as f64 + 0.5, y as f64 + 0.5);
            let w0 = edge(b, c, p) / area;
            let w1 = edge(c, a, p) / area;
            let w2 = edge(a, b, p) / area;
            if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                blend(img, x, y, color, 1.0);
            }
        }
    }
}

/// 3x5 glyphs for decimal digits, one row per byte.
fn glyph(digit: char) -> &'static [u8; 5] {
    match digit {
        '0' => &[0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => &[0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => &[0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => &[0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => &[0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => &[0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => &[0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => &[0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => &[0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => &[0b111, 0b101, 0b111, 0b001, 0b111],
        _ => &[0; 5],
    }
}

/// Draw `text` centered on `center`, each font pixel `cell` pixels wide.
fn draw_label(img: &mut RgbImage, center: (f64, f64), text: &str, cell: i64, color: Rgb) {
    let chars = text.chars().count() as i64;
    let width = (chars * 4 - 1) * cell;
    let height = 5 * cell;
    let left = center.0.round() as i64 - width / 2;
    let top = center.1.round() as i64 - height / 2;

    for (i, ch) in text.chars().enumerate() {
        let x0 = left + i as i64 * 4 * cell;
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..3 {
                if bits & (1 << (2 - col)) == 0 {
                    continue;
                }
                for dy in 0..cell {
                    for dx in 0..cell {
                        blend(img, x0 + col * cell + dx, top + row as i64 * cell + dy, color, 1.0);
                    }
                }
            }
        }
    }
}

impl PngGenerator {
    pub fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    /// Draw the diagram into a raw RGB buffer.
    pub fn rasterize(&self, diagram: &Diagram) -> RgbImage {
        let style = Style::for_modulus(diagram.modulus(), &self.canvas);
        let bg = self.canvas.background;
        let mut img = RgbImage::from_pixel(
            self.canvas.width,
            self.canvas.height,
            image::Rgb([bg.r, bg.g, bg.b]),
        );

        for (edge, t) in diagram.colored_edges() {
            let from = self.canvas.project(diagram.positions[edge.from as usize]);
            let to = self.canvas.project(diagram.positions[edge.to as usize]);
            let Some(arrow) = Arrow::between(from, to, &style) else {
                continue;
            };
            let color = palette::scale(t);
            draw_thick_line(&mut img, arrow.start, arrow.shaft_end, style.edge_width, color);
            fill_triangle(&mut img, arrow.head, color);
        }

        let cell = ((style.font_size / 5.0).round() as i64).max(1);
        for node in diagram.graph.nodes() {
            let center = self.canvas.project(diagram.positions[node as usize]);
            fill_disc(&mut img, center, style.node_radius, self.canvas.node_color);
            if style.show_labels {
                draw_label(&mut img, center, &node.to_string(), cell, self.canvas.label_color);
            }
        }

        img
    }
}

impl Generator for PngGenerator {
    fn name(&self) -> &'static str {
        "png"
    }

    fn generate(&self, diagram: &Diagram) -> Result<Vec<u8>> {
        let img = self.rasterize(diagram);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    fn extension(&self) -> &'static str {
        "png"
    }

    fn mime_type(&self) -> &'static str {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::generate;
    use image::GenericImageView;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn small_canvas() -> Canvas {
        Canvas {
            width: 200,
            height: 200,
            ..Canvas::default()
        }
    }

    #[test]
    fn encodes_a_png_with_canvas_dimensions() {
        let diagram = generate(9, 2).unwrap();
        let bytes = PngGenerator::new(small_canvas()).generate(&diagram).unwrap();
        assert_eq!(bytes[..8], PNG_MAGIC);

        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!(decoded.dimensions(), (200, 200));
    }

    #[test]
    fn nodes_are_painted_on_the_ring() {
        let canvas = small_canvas();
        let diagram = generate(10, 1).unwrap();
        let img = PngGenerator::new(canvas.clone()).rasterize(&diagram);

        let (x, y) = canvas.project(diagram.positions[0]);
        let px = img.get_pixel(x as u32, y as u32).0;
        assert_ne!(px, [0xff, 0xff, 0xff]);

        let center = img.get_pixel(100, 100).0;
        assert_eq!(center, [0xff, 0xff, 0xff]);
    }

    #[test]
    fn edges_leave_color_inside_the_ring() {
        let canvas = Canvas {
            labels: false,
            ..small_canvas()
        };
        // x -> 0x mod 2 sends 1 to 0 straight across the ring.
        let diagram = generate(2, 0).unwrap();
        assert_eq!(diagram.graph.edge_count(), 1);

        let img = PngGenerator::new(canvas).rasterize(&diagram);
        let painted = (0..200).any(|x| img.get_pixel(x, 100).0 != [0xff, 0xff, 0xff]);
        assert!(painted);
        assert_ne!(img.get_pixel(100, 100).0, [0xff, 0xff, 0xff]);
    }

    #[test]
    fn rendering_is_deterministic() {
        let diagram = generate(60, 7).unwrap();
        let gen = PngGenerator::new(small_canvas());
        assert_eq!(gen.generate(&diagram).unwrap(), gen.generate(&diagram).unwrap());
    }
}

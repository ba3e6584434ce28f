//! Renderers - each turns a [`Diagram`] into an image file.

pub mod palette;
pub mod png;
pub mod svg;

use crate::config::RenderConfig;
use crate::error::{CardioidError, Result};
use crate::orbit::{Diagram, Position};
use palette::Rgb;
use serde::{Deserialize, Serialize};

/// Trait for all renderers.
pub trait Generator {
    /// Name of this renderer.
    fn name(&self) -> &'static str;

    /// Render the diagram to the bytes of a complete file.
    fn generate(&self, diagram: &Diagram) -> Result<Vec<u8>>;

    /// File extension for this renderer's output.
    fn extension(&self) -> &'static str;

    /// Content type for HTTP responses.
    fn mime_type(&self) -> &'static str;
}

/// Output formats the renderers support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Png,
    Svg,
}

impl Format {
    pub fn generator(self, canvas: Canvas) -> Box<dyn Generator + Send + Sync> {
        match self {
            Format::Png => Box::new(png::PngGenerator::new(canvas)),
            Format::Svg => Box::new(svg::SvgGenerator::new(canvas)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Png => "png",
            Format::Svg => "svg",
        }
    }
}

/// Size and colors of the drawing surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub labels: bool,
    pub background: Rgb,
    pub node_color: Rgb,
    pub label_color: Rgb,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            labels: true,
            background: Rgb::new(0xff, 0xff, 0xff),
            node_color: Rgb::new(0x1f, 0x78, 0xb4),
            label_color: Rgb::new(0, 0, 0),
        }
    }
}

impl Canvas {
    pub fn from_config(config: &RenderConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(CardioidError::render(format!(
                "canvas must be non-empty, got {}x{}",
                config.width, config.height
            )));
        }
        Ok(Self {
            width: config.width,
            height: config.height,
            labels: config.labels,
            background: parse_color("background", &config.background)?,
            node_color: parse_color("node_color", &config.node_color)?,
            label_color: parse_color("label_color", &config.label_color)?,
        })
    }

    /// Cache key fragment covering everything that changes the rendered bytes.
    pub fn fingerprint(&self) -> String {
        format!(
            "{}x{}:{}:{}:{}:{}",
            self.width,
            self.height,
            self.labels,
            self.background.to_hex(),
            self.node_color.to_hex(),
            self.label_color.to_hex()
        )
    }

    fn scale(&self) -> f64 {
        self.width.min(self.height) as f64 / 800.0
    }

    /// Radius of the node circle in pixels.
    fn ring_radius(&self) -> f64 {
        self.width.min(self.height) as f64 / 2.0 * 0.9
    }

    /// Map a unit-circle position to pixel coordinates, y axis pointing up.
    pub fn project(&self, p: Position) -> (f64, f64) {
        let cx = self.width as f64 / 2.0;
        let cy = self.height as f64 / 2.0;
        let r = self.ring_radius();
        (cx + p.x * r, cy - p.y * r)
    }
}

fn parse_color(field: &str, value: &str) -> Result<Rgb> {
    Rgb::from_hex(value)
        .ok_or_else(|| CardioidError::render(format!("{field} is not a hex color: {value:?}")))
}

/// Cosmetic sizes derived from the modulus. They shrink exponentially as
/// the node count grows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    pub node_radius: f64,
    pub font_size: f64,
    pub edge_width: f64,
    pub arrow_length: f64,
    pub show_labels: bool,
}

const MIN_LEGIBLE_FONT: f64 = 6.0;

fn decay(min: f64, max: f64, modulus: u64, tau: f64) -> f64 {
    min + (max - min) * (-(modulus as f64) / tau).exp()
}

impl Style {
    pub fn for_modulus(modulus: u64, canvas: &Canvas) -> Self {
        let scale = canvas.scale();
        let node_radius = decay(1.5, 12.0, modulus, 40.0) * scale;
        let font_size = decay(4.0, 14.0, modulus, 60.0) * scale;
        let edge_width = decay(0.6, 2.0, modulus, 100.0) * scale;

        Self {
            node_radius,
            font_size,
            edge_width,
            arrow_length: node_radius * 0.8 + 3.0 * scale,
            show_labels: canvas.labels && font_size >= MIN_LEGIBLE_FONT * scale,
        }
    }
}

/// An edge shortened to the node boundaries, with its arrowhead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrow {
    pub start: (f64, f64),
    /// Where the shaft meets the arrowhead base.
    pub shaft_end: (f64, f64),
    /// Arrowhead triangle: tip, then the two base corners.
    pub head: [(f64, f64); 3],
}

impl Arrow {
    /// `None` when the nodes overlap on the canvas.
    pub fn between(from: (f64, f64), to: (f64, f64), style: &Style) -> Option<Self> {
        let dx = to.0 - from.0;
        let dy = to.1 - from.1;
        let len = (dx * dx + dy * dy).sqrt();
        if len <= 2.0 * style.node_radius + f64::EPSILON {
            return None;
        }

        let (ux, uy) = (dx / len, dy / len);
        let start = (from.0 + ux * style.node_radius, from.1 + uy * style.node_radius);
        let tip = (to.0 - ux * style.node_radius, to.1 - uy * style.node_radius);

        let head_len = style.arrow_length.min(len - 2.0 * style.node_radius);
        let half_width = head_len * 0.4;
        let base = (tip.0 - ux * head_len, tip.1 - uy * head_len);
        let (px, py) = (-uy, ux);

        Some(Self {
            start,
            shaft_end: base,
            head: [
                tip,
                (base.0 + px * half_width, base.1 + py * half_width),
                (base.0 - px * half_width, base.1 - py * half_width),
            ],
        })
    }
}

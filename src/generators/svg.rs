//! SVG renderer.
//!
//! Draws edges first, colored through the palette scale, then the nodes on
//! top so the ring stays readable when edges are dense.

use crate::error::Result;
use crate::generators::palette;
use crate::generators::{Arrow, Canvas, Generator, Style};
use crate::orbit::Diagram;

pub struct SvgGenerator {
    pub canvas: Canvas,
}

impl Default for SvgGenerator {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

impl SvgGenerator {
    pub fn new(canvas: Canvas) -> Self {
        Self { canvas }
    }

    fn draw_edges(&self, diagram: &Diagram, style: &Style) -> Vec<String> {
        diagram
            .colored_edges()
            .filter_map(|(edge, t)| {
                let from = self.canvas.project(diagram.positions[edge.from as usize]);
                let to = self.canvas.project(diagram.positions[edge.to as usize]);
                let arrow = Arrow::between(from, to, style)?;
                let color = palette::scale(t).to_hex();
                let [tip, left, right] = arrow.head;

                Some(format!(
                    r#"<line x1="{:.2}" y1="{:.2}" x2="{:.2}" y2="{:.2}" stroke="{}" stroke-width="{:.2}" stroke-linecap="round"/>
<polygon points="{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}" fill="{}"/>"#,
                    arrow.start.0,
                    arrow.start.1,
                    arrow.shaft_end.0,
                    arrow.shaft_end.1,
                    color,
                    style.edge_width,
                    tip.0,
                    tip.1,
                    left.0,
                    left.1,
                    right.0,
                    right.1,
                    color
                ))
            })
            .collect()
    }

    fn draw_nodes(&self, diagram: &Diagram, style: &Style) -> Vec<String> {
        let fill = self.canvas.node_color.to_hex();
        let label = self.canvas.label_color.to_hex();

        diagram
            .graph
            .nodes()
            .map(|node| {
                let (x, y) = self.canvas.project(diagram.positions[node as usize]);
                let mut element = format!(
                    r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
                    x, y, style.node_radius, fill
                );
                if style.show_labels {
                    element.push_str(&format!(
                        "\n<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\">{}</text>",
                        x, y, style.font_size, label, node
                    ));
                }
                element
            })
            .collect()
    }

    fn wrap_svg(&self, title: &str, content: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}" font-family="sans-serif">
  <title>{}</title>
  <rect width="100%" height="100%" fill="{}"/>
  {}
</svg>"#,
            self.canvas.width,
            self.canvas.height,
            self.canvas.width,
            self.canvas.height,
            title,
            self.canvas.background.to_hex(),
            content
        )
    }
}

impl Generator for SvgGenerator {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn generate(&self, diagram: &Diagram) -> Result<Vec<u8>> {
        let style = Style::for_modulus(diagram.modulus(), &self.canvas);
        let edges = self.draw_edges(diagram, &style);
        let nodes = self.draw_nodes(diagram, &style);

        let title = format!("x -> {}x mod {}", diagram.multiplier(), diagram.modulus());
        let svg = self.wrap_svg(
            &title,
            &format!("{}\n{}", edges.join("\n"), nodes.join("\n")),
        );
        Ok(svg.into_bytes())
    }

    fn extension(&self) -> &'static str {
        "svg"
    }

    fn mime_type(&self) -> &'static str {
        "image/svg+xml"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::generate;

    fn render(modulus: u64, multiplier: u64) -> String {
        let diagram = generate(modulus, multiplier).unwrap();
        String::from_utf8(SvgGenerator::default().generate(&diagram).unwrap()).unwrap()
    }

    #[test]
    fn one_line_per_edge_and_one_circle_per_node() {
        let svg = render(7, 3);
        assert_eq!(svg.matches("<line ").count(), 6);
        assert_eq!(svg.matches("<polygon ").count(), 6);
        assert_eq!(svg.matches("<circle ").count(), 7);
        assert!(svg.contains("<title>x -> 3x mod 7</title>"));
    }

    #[test]
    fn labels_are_dropped_for_large_moduli() {
        assert!(render(12, 2).contains("<text "));
        assert!(!render(400, 2).contains("<text "));
    }

    #[test]
    fn no_edges_still_renders_nodes() {
        let svg = render(10, 1);
        assert_eq!(svg.matches("<line ").count(), 0);
        assert_eq!(svg.matches("<circle ").count(), 10);
    }

    #[test]
    fn output_is_deterministic() {
        assert_eq!(render(120, 37), render(120, 37));
    }
}

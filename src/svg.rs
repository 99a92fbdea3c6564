use crate::diagram::{Diagram, Label, Marker, MarkerKind};
use std::fmt::{self, Write};

const PALETTE: [&str; 8] = [
    "#d7263d", "#1b998b", "#2e86ab", "#f49d37", "#7b2cbf", "#3f88c5", "#8a9b0f", "#c44900",
];

/// Renders a [`Diagram`] as a standalone SVG document.
pub struct SvgRenderer {
    /// Pixels per diagram unit.
    pub scale: f64,
    /// Extra units right of the diagram for route names.
    pub gutter: f64,
    pub line_width: f64,
    pub marker_radius: f64,
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self {
            scale: 8.0,
            gutter: 22.0,
            line_width: 0.8,
            marker_radius: 0.9,
        }
    }
}

impl SvgRenderer {
    pub fn render(&self, diagram: &Diagram) -> String {
        let mut svg = String::new();
        // writing into a String cannot fail
        let _ = self.write_document(&mut svg, diagram);
        svg
    }

    fn write_document(&self, svg: &mut String, diagram: &Diagram) -> fmt::Result {
        let s = self.scale;
        let width = (diagram.width + self.gutter) * s;
        let height = diagram.height * s;

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            width, height, width, height
        )?;

        // Style
        writeln!(
            svg,
            r#"<style>
  .title {{ font-family: sans-serif; font-size: 16px; font-weight: bold; fill: #222; }}
  .route {{ fill: none; stroke-linecap: round; }}
  .route-name {{ font-family: monospace; font-size: 12px; font-weight: bold; }}
  .marker {{ fill: #fff; stroke: #333; stroke-width: 1.5; }}
  .origin {{ fill: #333; }}
  .label {{ font-family: sans-serif; font-size: 11px; fill: #333; }}
</style>"#
        )?;

        writeln!(
            svg,
            r#"<text class="title" x="{}" y="{}">{}</text>"#,
            diagram.origin_x * s,
            6.0 * s,
            escape_xml(&diagram.stop_name)
        )?;

        // Route lines first (behind markers)
        for route in &diagram.routes {
            let colour = PALETTE[route.row % PALETTE.len()];
            let y = route.y * s;
            writeln!(
                svg,
                r#"<line class="route" x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" />"#,
                diagram.origin_x * s,
                y,
                route.end_x * s,
                y,
                colour,
                self.line_width * s
            )?;
            writeln!(
                svg,
                r#"<text class="route-name" x="{}" y="{}" fill="{}" dominant-baseline="middle">{}</text>"#,
                (route.end_x + 2.0) * s,
                y,
                colour,
                escape_xml(route.route_id.as_str())
            )?;
        }

        let row_y: Vec<f64> = diagram.routes.iter().map(|r| r.y).collect();
        for (i, marker) in diagram.markers.iter().enumerate() {
            // the first marker is the selected stop
            self.write_marker(svg, marker, &row_y, i == 0)?;
        }

        for label in &diagram.labels {
            self.write_label(svg, label)?;
        }

        writeln!(svg, "</svg>")
    }

    fn write_marker(&self, svg: &mut String, marker: &Marker, row_y: &[f64], origin: bool) -> fmt::Result {
        let s = self.scale;
        let r = self.marker_radius * s;
        let x = marker.x * s;
        let top = row_y.get(marker.route_row_start).copied().unwrap_or(0.0) * s;
        let bottom = row_y.get(marker.route_row_end).copied().unwrap_or(0.0) * s;
        let class = if origin { "marker origin" } else { "marker" };

        match marker.kind {
            MarkerKind::Single => writeln!(
                svg,
                r#"<circle class="{}" cx="{}" cy="{}" r="{}"><title>{}</title></circle>"#,
                class,
                x,
                top,
                r,
                escape_xml(&marker.name)
            ),
            MarkerKind::Merged => writeln!(
                svg,
                r#"<rect class="{}" x="{}" y="{}" width="{}" height="{}" rx="{}"><title>{}</title></rect>"#,
                class,
                x - r,
                top - r,
                r * 2.0,
                bottom - top + r * 2.0,
                r,
                escape_xml(&marker.name)
            ),
        }
    }

    fn write_label(&self, svg: &mut String, label: &Label) -> fmt::Result {
        let s = self.scale;
        let (x, y) = (label.x * s, label.y * s);
        writeln!(
            svg,
            r#"<text class="label" x="{}" y="{}" transform="rotate({} {} {})">{}</text>"#,
            x,
            y,
            label.rotation,
            x,
            y,
            escape_xml(&label.text)
        )
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

use unicode_width::UnicodeWidthStr;

/// Approximate text metrics in diagram units.
pub struct TextMetrics {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            char_width: 1.1,
            line_height: 2.2,
        }
    }
}

/// Axis-aligned box around a rotated label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub width: f64,
    pub height: f64,
}

impl TextMetrics {
    pub fn text_width(&self, text: &str) -> f64 {
        let width = UnicodeWidthStr::width(text);
        width as f64 * self.char_width
    }

    /// Bounding box of `text` rotated by `rotation_deg` around its start.
    pub fn footprint(&self, text: &str, rotation_deg: f64) -> Footprint {
        let w = self.text_width(text);
        let h = self.line_height;
        let theta = rotation_deg.abs().to_radians();
        let (sin, cos) = theta.sin_cos();
        Footprint {
            width: w * cos + h * sin,
            height: w * sin + h * cos,
        }
    }
}

//! Tunable bounds and layout constants.
//!
//! Coordinates are "diagram units": x spans `[0, 100]`, y grows downward on
//! the same scale.

use serde::{Deserialize, Serialize};

/// A `LayoutConfig` the layout stages cannot work with.
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("min_spacing must be positive (got {0})")]
    NoSpacing(f64),
    #[error("left_pad {left} and right_pad {right} leave no usable width")]
    NoUsableWidth { left: f64, right: f64 },
}

/// Per-request bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DiagramOptions {
    /// Onward stops each route should display.
    pub target_major_stops: usize,
    pub max_routes: usize,
}

impl Default for DiagramOptions {
    fn default() -> Self {
        Self {
            target_major_stops: 5,
            max_routes: 8,
        }
    }
}

/// Thresholds and spacing used by the layout stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub left_pad: f64,
    pub right_pad: f64,
    /// Minimum distance between two distinct stop positions.
    pub min_spacing: f64,
    /// Step used when extrapolating from a single anchor.
    pub minor_spacing: f64,
    /// Jaccard similarity at which two routes join a cluster.
    pub similarity_threshold: f64,
    /// Fraction of the best ranking a stop needs to always be shown.
    pub significance_ratio: f64,
    /// Label rotation in degrees (negative = counter-clockwise).
    pub label_rotation: f64,
    pub label_offset: f64,
    /// Extra lift per unit of rotated label height.
    pub label_lift: f64,
    pub label_gap: f64,
    pub label_min_vertical: f64,
    pub max_drift: f64,
    pub stack_tolerance: f64,
    pub row_spacing: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    /// X of the selected stop, where every route line starts.
    pub origin_x: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left_pad: 6.0,
            right_pad: 4.0,
            min_spacing: 3.0,
            minor_spacing: 6.0,
            similarity_threshold: 0.2,
            significance_ratio: 0.2,
            label_rotation: -20.0,
            label_offset: 1.5,
            label_lift: 0.25,
            label_gap: 0.6,
            label_min_vertical: 3.0,
            max_drift: 6.0,
            stack_tolerance: 1.0,
            row_spacing: 14.0,
            top_margin: 22.0,
            bottom_margin: 6.0,
            origin_x: 2.0,
        }
    }
}

impl LayoutConfig {
    /// Reject values that would break the layout stages: non-finite numbers,
    /// negative spacing or drift, and pads that overlap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("left_pad", self.left_pad),
            ("right_pad", self.right_pad),
            ("min_spacing", self.min_spacing),
            ("minor_spacing", self.minor_spacing),
            ("similarity_threshold", self.similarity_threshold),
            ("significance_ratio", self.significance_ratio),
            ("label_rotation", self.label_rotation),
            ("label_offset", self.label_offset),
            ("label_lift", self.label_lift),
            ("label_gap", self.label_gap),
            ("label_min_vertical", self.label_min_vertical),
            ("max_drift", self.max_drift),
            ("stack_tolerance", self.stack_tolerance),
            ("row_spacing", self.row_spacing),
            ("top_margin", self.top_margin),
            ("bottom_margin", self.bottom_margin),
            ("origin_x", self.origin_x),
        ];
        if let Some((field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(ConfigError::NotFinite { field });
        }

        let non_negative = [
            ("left_pad", self.left_pad),
            ("right_pad", self.right_pad),
            ("minor_spacing", self.minor_spacing),
            ("label_gap", self.label_gap),
            ("label_min_vertical", self.label_min_vertical),
            ("max_drift", self.max_drift),
            ("stack_tolerance", self.stack_tolerance),
            ("row_spacing", self.row_spacing),
        ];
        if let Some(&(field, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(ConfigError::Negative { field, value });
        }

        if self.min_spacing <= 0.0 {
            return Err(ConfigError::NoSpacing(self.min_spacing));
        }
        if self.lo() >= self.hi() {
            return Err(ConfigError::NoUsableWidth {
                left: self.left_pad,
                right: self.right_pad,
            });
        }
        Ok(())
    }

    /// Leftmost position a stop may take.
    pub fn lo(&self) -> f64 {
        self.left_pad
    }

    /// Rightmost position a stop may take.
    pub fn hi(&self) -> f64 {
        100.0 - self.right_pad
    }

    pub fn usable_width(&self) -> f64 {
        (self.hi() - self.lo()).max(0.0)
    }

    /// Y coordinate of a route row.
    pub fn row_y(&self, row: usize) -> f64 {
        self.top_margin + row as f64 * self.row_spacing
    }

    pub fn height(&self, rows: usize) -> f64 {
        self.row_y(rows.saturating_sub(1)) + self.bottom_margin
    }
}

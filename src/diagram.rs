//! The finished diagram handed to renderers.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{RouteId, StopId};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum DiagramError {
    #[error("Stop not found: {0}")]
    StopNotFound(StopId),
    #[error("No routes continue beyond stop {0}")]
    NoRoutesFound(StopId),
}

impl DiagramError {
    /// True when the caller should show an empty state rather than an error.
    pub fn is_empty_state(&self) -> bool {
        matches!(self, Self::NoRoutesFound(_))
    }
}

/// How widely a stop name is shared among the displayed routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NameKind {
    /// Present in every route.
    Universal,
    /// Shared by routes from different clusters.
    CrossGroup,
    /// Shared by routes of a single cluster.
    GroupLocal,
    /// Unique to one route.
    RouteLocal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamePosition {
    pub name: String,
    pub position: f64,
    pub kind: NameKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramRoute {
    pub route_id: RouteId,
    pub route_name: String,
    pub destination: StopId,
    /// Displayed onward stops in travel order, excluding the selected stop.
    pub displayed_stops: Vec<StopId>,
    /// Names of `displayed_stops`, index for index.
    pub displayed_names: Vec<String>,
    pub row: usize,
    pub y: f64,
    /// X of the last displayed stop.
    pub end_x: f64,
    pub trip_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub row_start: usize,
    pub row_end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    Single,
    Merged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub kind: MarkerKind,
    pub name: String,
    pub x: f64,
    pub route_row_start: usize,
    pub route_row_end: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
    pub stop_id: StopId,
    pub stop_name: String,
    pub routes: Vec<DiagramRoute>,
    pub positions: BTreeMap<String, f64>,
    pub names: Vec<NamePosition>,
    pub labels: Vec<Label>,
    pub markers: Vec<Marker>,
    pub origin_x: f64,
    pub width: f64,
    pub height: f64,
}

impl Diagram {
    pub fn position(&self, name: &str) -> Option<f64> {
        self.positions.get(name).copied()
    }

    pub fn kind(&self, name: &str) -> Option<NameKind> {
        self.names.iter().find(|n| n.name == name).map(|n| n.kind)
    }

    pub fn to_json(&self) -> String {
        // Every field is a plain string, number or sequence.
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_state() {
        assert!(DiagramError::NoRoutesFound("s".into()).is_empty_state());
        assert!(!DiagramError::StopNotFound("s".into()).is_empty_state());
    }

    #[test]
    fn test_json_shape() {
        let diagram = Diagram {
            stop_id: "s1".into(),
            stop_name: "Majestic".into(),
            routes: vec![DiagramRoute {
                route_id: "500D".into(),
                route_name: "500D".into(),
                destination: "s3".into(),
                displayed_stops: vec!["s3".into()],
                displayed_names: vec!["Hebbal".into()],
                row: 0,
                y: 22.0,
                end_x: 96.0,
                trip_count: 12,
            }],
            positions: [("Hebbal".to_string(), 96.0)].into_iter().collect(),
            names: vec![NamePosition {
                name: "Hebbal".into(),
                position: 96.0,
                kind: NameKind::Universal,
            }],
            labels: vec![],
            markers: vec![Marker {
                kind: MarkerKind::Single,
                name: "Hebbal".into(),
                x: 96.0,
                route_row_start: 0,
                route_row_end: 0,
            }],
            origin_x: 2.0,
            width: 100.0,
            height: 28.0,
        };

        let value: serde_json::Value = serde_json::from_str(&diagram.to_json()).unwrap();
        assert_eq!(value["stopId"], "s1");
        assert_eq!(value["routes"][0]["routeId"], "500D");
        assert_eq!(value["routes"][0]["displayedStops"][0], "s3");
        assert_eq!(value["positions"]["Hebbal"], 96.0);
        assert_eq!(value["names"][0]["kind"], "universal");
        assert_eq!(value["markers"][0]["kind"], "single");
        assert_eq!(value["markers"][0]["routeRowEnd"], 0);
        assert_eq!(diagram.kind("Hebbal"), Some(NameKind::Universal));
    }
}

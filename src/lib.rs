pub mod catalog;
pub mod config;
pub mod diagram;
pub mod layout;
pub mod loader;
pub mod measure;
pub mod model;
pub mod ranking;
pub mod svg;

use wasm_bindgen::prelude::*;

pub use catalog::{DataSources, StaticCatalog};
pub use config::{ConfigError, DiagramOptions, LayoutConfig};
pub use diagram::{Diagram, DiagramError};
pub use layout::LayoutEngine;
pub use model::{RouteId, StopId};

use svg::SvgRenderer;

/// Compute the diagram for `stop` with the default layout configuration.
pub fn compute_diagram(
    sources: &DataSources<'_>,
    stop: &StopId,
    options: &DiagramOptions,
) -> Result<Diagram, DiagramError> {
    LayoutEngine::default().compute(sources, stop, options)
}

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Load bundle documents and lay out one stop. Ranking is derived from the
/// routes when the bundle has none.
fn bundle_diagram(
    stops: &str,
    services: &str,
    ranking: Option<&str>,
    stop_id: &str,
    major_stops: Option<u32>,
    max_routes: Option<u32>,
) -> Result<Diagram, String> {
    let mut catalog = loader::from_json_strs(stops, services, ranking).map_err(|e| e.to_string())?;
    if !catalog.has_ranking() {
        let scores = ranking::rank_stops(catalog.routes());
        catalog.set_ranking(scores);
    }

    let defaults = DiagramOptions::default();
    let options = DiagramOptions {
        target_major_stops: major_stops.map_or(defaults.target_major_stops, |n| n as usize),
        max_routes: max_routes.map_or(defaults.max_routes, |n| n as usize),
    };
    let sources = DataSources::from_catalog(&catalog);
    compute_diagram(&sources, &StopId::new(stop_id), &options).map_err(|e| e.to_string())
}

fn js_error(message: String) -> JsValue {
    js_sys::Error::new(&message).into()
}

/// Diagram for a stop as JSON
#[wasm_bindgen(js_name = "stopDiagram")]
pub fn stop_diagram(
    stops: &str,
    services: &str,
    ranking: Option<String>,
    stop_id: &str,
    major_stops: Option<u32>,
    max_routes: Option<u32>,
) -> Result<String, JsValue> {
    bundle_diagram(stops, services, ranking.as_deref(), stop_id, major_stops, max_routes)
        .map(|d| d.to_json())
        .map_err(js_error)
}

/// Diagram for a stop rendered to SVG
#[wasm_bindgen(js_name = "stopDiagramSvg")]
pub fn stop_diagram_svg(
    stops: &str,
    services: &str,
    ranking: Option<String>,
    stop_id: &str,
    major_stops: Option<u32>,
    max_routes: Option<u32>,
) -> Result<String, JsValue> {
    bundle_diagram(stops, services, ranking.as_deref(), stop_id, major_stops, max_routes)
        .map(|d| SvgRenderer::default().render(&d))
        .map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOPS: &str = r#"{"1": [77.5, 12.9, "Depot", ""], "2": [77.6, 12.9, "Market", ""], "3": [77.7, 12.9, "Lake", ""]}"#;
    const SERVICES: &str = r#"{"7": {"name": "Depot - Lake", "3": [[1, 2, 3]]}}"#;

    #[test]
    fn test_bundle_diagram_without_ranking() {
        let d = bundle_diagram(STOPS, SERVICES, None, "1", None, None).unwrap();
        assert_eq!(d.stop_name, "Depot");
        assert_eq!(d.routes[0].displayed_names, vec!["Market", "Lake"]);
    }

    #[test]
    fn test_bundle_diagram_errors_are_messages() {
        let err = bundle_diagram(STOPS, SERVICES, None, "3", None, None).unwrap_err();
        assert!(err.contains("No routes"), "{err}");
        let err = bundle_diagram(STOPS, SERVICES, None, "9", None, None).unwrap_err();
        assert!(err.contains("not found"), "{err}");
    }

    #[test]
    fn test_options_are_applied() {
        let d = bundle_diagram(STOPS, SERVICES, None, "1", Some(1), Some(1)).unwrap();
        // the terminus is always kept, so one target stop leaves just the lake
        assert_eq!(d.routes[0].displayed_names, vec!["Lake"]);
    }
}

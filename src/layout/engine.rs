//! Layout engine core implementation.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::DataSources;
use crate::config::{ConfigError, DiagramOptions, LayoutConfig};
use crate::diagram::{Diagram, DiagramError, DiagramRoute};
use crate::measure::TextMetrics;
use crate::model::StopId;

use super::clustering::{cluster_routes, tag_names};
use super::context::LayoutContext;
use super::labels::{build_markers, place_labels};
use super::major::{filter_routes, name_scores, select_major_names};
use super::ordering::order_routes;
use super::positions::assign_positions;
use super::selection::select_routes;

/// Layout engine configuration and computation.
pub struct LayoutEngine {
    pub(crate) metrics: TextMetrics,
    pub(crate) config: LayoutConfig,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self {
            metrics: TextMetrics::default(),
            config: LayoutConfig::default(),
        }
    }
}

impl LayoutEngine {
    /// Engine with a custom configuration, rejected when the stages could not
    /// lay anything out with it.
    pub fn with_config(config: LayoutConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::default()
        })
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Compute the diagram for `stop`.
    pub fn compute(
        &self,
        sources: &DataSources<'_>,
        stop: &StopId,
        options: &DiagramOptions,
    ) -> Result<Diagram, DiagramError> {
        let stop_name = sources
            .stops
            .stop(stop)
            .map(|s| s.name.clone())
            .ok_or_else(|| DiagramError::StopNotFound(stop.clone()))?;

        let _span = tracing::debug_span!("diagram", stop = %stop).entered();
        let cfg = &self.config;
        let mut ctx = LayoutContext::new(cfg, &self.metrics, stop.clone(), stop_name.clone());

        // Phase 1: Route selection
        let mut selected = select_routes(sources, &ctx, options);
        if selected.is_empty() {
            return Err(DiagramError::NoRoutesFound(stop.clone()));
        }

        // Phase 2: Ordering
        order_routes(&mut selected);

        // Phase 3: Similarity clusters over the full onward sequences
        let onward: Vec<&[Arc<str>]> = selected.iter().map(|r| r.onward()).collect();
        let clusters = cluster_routes(&onward, cfg.similarity_threshold);
        tracing::debug!(routes = selected.len(), clusters = clusters.len(), "routes ordered");

        // Phase 4: Major stops
        let scores = name_scores(&selected, sources.ranking);
        let keep = select_major_names(&onward, &scores, options.target_major_stops, cfg.significance_ratio);
        let displayed = filter_routes(&selected, &keep);
        tracing::debug!(names = keep.len(), "major stops selected");

        // Phase 5: Name tiers
        let tags = tag_names(&displayed, &clusters);

        // Phase 6: Positions
        let names = assign_positions(&mut ctx, &displayed, &tags, &clusters);

        // Phase 7: Markers and labels
        let markers = build_markers(&ctx, &names, &tags, displayed.len());
        let labels = place_labels(&ctx, &names, &tags);

        let routes = selected
            .iter()
            .zip(&displayed)
            .enumerate()
            .map(|(row, (sel, shown))| DiagramRoute {
                route_id: sel.route.route_id.clone(),
                route_name: sel.route.route_name.to_string(),
                destination: sel.route.destination.clone(),
                displayed_stops: shown.stops.clone(),
                displayed_names: shown.names.iter().map(|n| n.to_string()).collect(),
                row,
                y: cfg.row_y(row),
                end_x: shown
                    .names
                    .last()
                    .and_then(|n| ctx.position(n))
                    .unwrap_or(cfg.origin_x),
                trip_count: sel.trip_count,
            })
            .collect();

        let positions: BTreeMap<String, f64> = names
            .iter()
            .map(|n| (n.name.clone(), n.position))
            .collect();

        Ok(Diagram {
            stop_id: stop.clone(),
            stop_name: stop_name.to_string(),
            routes,
            positions,
            names,
            labels,
            markers,
            origin_x: cfg.origin_x,
            width: 100.0,
            height: cfg.height(displayed.len()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::model::{Route, Stop};

    fn catalog() -> StaticCatalog {
        let stops = ["a", "b", "c", "d"]
            .iter()
            .map(|id| Stop::new((*id).into(), &id.to_uppercase(), 77.5, 12.9).unwrap())
            .collect();
        let routes = vec![
            Route::new("1".into(), "Red", vec!["a".into(), "b".into(), "c".into()]).unwrap(),
            Route::new("2".into(), "Blue", vec!["a".into(), "b".into(), "d".into()]).unwrap(),
        ];
        StaticCatalog::new(stops, routes)
    }

    #[test]
    fn test_unknown_stop() {
        let catalog = catalog();
        let sources = DataSources::from_catalog(&catalog);
        let err = LayoutEngine::default()
            .compute(&sources, &"zz".into(), &DiagramOptions::default())
            .unwrap_err();
        assert_eq!(err, DiagramError::StopNotFound("zz".into()));
    }

    #[test]
    fn test_terminus_has_no_routes() {
        let catalog = catalog();
        let sources = DataSources::from_catalog(&catalog);
        let err = LayoutEngine::default()
            .compute(&sources, &"c".into(), &DiagramOptions::default())
            .unwrap_err();
        assert!(err.is_empty_state());
    }

    #[test]
    fn test_rows_and_geometry() {
        let catalog = catalog();
        let sources = DataSources::from_catalog(&catalog);
        let engine = LayoutEngine::default();
        let diagram = engine
            .compute(&sources, &"a".into(), &DiagramOptions::default())
            .unwrap();

        assert_eq!(diagram.stop_name, "A");
        assert_eq!(diagram.routes.len(), 2);
        assert_eq!(diagram.routes[0].row, 0);
        assert_eq!(diagram.routes[1].y, engine.config().row_y(1));
        assert_eq!(diagram.height, engine.config().height(2));
        for route in &diagram.routes {
            let last = route.displayed_names.last().unwrap();
            assert_eq!(Some(route.end_x), diagram.position(last));
            assert!(!route.displayed_stops.contains(&"a".into()));
        }
        // B is shared by both rows: one merged marker plus the origin
        let merged: Vec<&str> = diagram
            .markers
            .iter()
            .filter(|m| m.kind == crate::diagram::MarkerKind::Merged)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(merged, vec!["A", "B"]);
    }

    #[test]
    fn test_with_config_changes_padding() {
        let catalog = catalog();
        let sources = DataSources::from_catalog(&catalog);
        let engine = LayoutEngine::with_config(LayoutConfig {
            left_pad: 20.0,
            ..LayoutConfig::default()
        })
        .unwrap();
        let diagram = engine
            .compute(&sources, &"a".into(), &DiagramOptions::default())
            .unwrap();
        let min = diagram.positions.values().copied().fold(f64::INFINITY, f64::min);
        assert_eq!(min, 20.0);
    }

    #[test]
    fn test_with_config_rejects_unusable_configs() {
        let negative_drift: LayoutConfig = serde_json::from_str(r#"{ "max_drift": -1 }"#).unwrap();
        assert!(matches!(
            LayoutEngine::with_config(negative_drift),
            Err(ConfigError::Negative { field: "max_drift", .. })
        ));

        let overlapping_pads: LayoutConfig =
            serde_json::from_str(r#"{ "left_pad": 60, "right_pad": 50 }"#).unwrap();
        assert!(matches!(
            LayoutEngine::with_config(overlapping_pads),
            Err(ConfigError::NoUsableWidth { .. })
        ));
    }
}

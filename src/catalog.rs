//! Read-only data sources consumed by the layout pipeline.
//!
//! The pipeline never fetches anything itself; callers hand it a
//! [`DataSources`] snapshot. [`StaticCatalog`] is the in-memory
//! implementation used by the CLI, the wasm bindings and the tests.

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{Route, RouteId, Stop, StopId};

/// Routes whose stop sequence contains a given stop.
pub trait RouteCatalog {
    fn routes_through(&self, stop: &StopId) -> Vec<&Route>;
}

/// `StopId -> Stop` lookup.
pub trait StopDirectory {
    fn stop(&self, id: &StopId) -> Option<&Stop>;
}

/// Stop importance. Missing stops score 0.
pub trait RankingSource {
    fn score(&self, stop: &StopId) -> f64;
}

/// Route frequency used for the initial route ranking. Missing routes count 0.
pub trait TripCountSource {
    fn trip_count(&self, route: &Route) -> u32;
}

impl RankingSource for HashMap<StopId, f64> {
    fn score(&self, stop: &StopId) -> f64 {
        self.get(stop).copied().unwrap_or(0.0)
    }
}

/// The snapshot a single diagram computation reads from.
#[derive(Clone, Copy)]
pub struct DataSources<'a> {
    pub routes: &'a dyn RouteCatalog,
    pub stops: &'a dyn StopDirectory,
    pub ranking: &'a dyn RankingSource,
    pub trips: &'a dyn TripCountSource,
}

impl<'a> DataSources<'a> {
    /// Use one catalog for every source.
    pub fn from_catalog(catalog: &'a StaticCatalog) -> Self {
        Self {
            routes: catalog,
            stops: catalog,
            ranking: catalog,
            trips: catalog,
        }
    }

    /// Same sources with a different ranking.
    pub fn with_ranking(self, ranking: &'a dyn RankingSource) -> Self {
        Self { ranking, ..self }
    }

    /// Display name for a stop, falling back to its id.
    pub fn stop_name(&self, id: &StopId) -> Arc<str> {
        match self.stops.stop(id) {
            Some(stop) => stop.name.clone(),
            None => id.as_str().into(),
        }
    }
}

/// In-memory catalog holding stops, route patterns, rankings and trip counts.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    stops: HashMap<StopId, Stop>,
    routes: Vec<Route>,
    /// Stop -> indices into `routes`, in catalog order.
    stop_index: HashMap<StopId, Vec<usize>>,
    ranking: HashMap<StopId, f64>,
    trip_counts: HashMap<(RouteId, StopId), u32>,
}

impl StaticCatalog {
    pub fn new(stops: Vec<Stop>, routes: Vec<Route>) -> Self {
        let stops: HashMap<StopId, Stop> = stops.into_iter().map(|s| (s.id.clone(), s)).collect();

        let mut stop_index: HashMap<StopId, Vec<usize>> = HashMap::new();
        for (idx, route) in routes.iter().enumerate() {
            for stop in &route.stops {
                let entry = stop_index.entry(stop.clone()).or_default();
                if entry.last() != Some(&idx) {
                    entry.push(idx);
                }
            }
        }

        Self {
            stops,
            routes,
            stop_index,
            ranking: HashMap::new(),
            trip_counts: HashMap::new(),
        }
    }

    pub fn with_ranking(mut self, ranking: HashMap<StopId, f64>) -> Self {
        self.ranking = ranking;
        self
    }

    pub fn set_ranking(&mut self, ranking: HashMap<StopId, f64>) {
        self.ranking = ranking;
    }

    pub fn has_ranking(&self) -> bool {
        !self.ranking.is_empty()
    }

    /// Record the trip count of `route_id` towards `destination`.
    pub fn set_trip_count(&mut self, route_id: RouteId, destination: StopId, count: u32) {
        self.trip_counts.insert((route_id, destination), count);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }
}

impl RouteCatalog for StaticCatalog {
    fn routes_through(&self, stop: &StopId) -> Vec<&Route> {
        self.stop_index
            .get(stop)
            .map(|indices| indices.iter().map(|&i| &self.routes[i]).collect())
            .unwrap_or_default()
    }
}

impl StopDirectory for StaticCatalog {
    fn stop(&self, id: &StopId) -> Option<&Stop> {
        self.stops.get(id)
    }
}

impl RankingSource for StaticCatalog {
    fn score(&self, stop: &StopId) -> f64 {
        self.ranking.score(stop)
    }
}

impl TripCountSource for StaticCatalog {
    fn trip_count(&self, route: &Route) -> u32 {
        self.trip_counts
            .get(&(route.route_id.clone(), route.destination.clone()))
            .copied()
            .unwrap_or(0)
    }
}

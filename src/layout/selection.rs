//! Route selection: which routes through the stop get a row.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::DataSources;
use crate::config::DiagramOptions;
use crate::model::{Route, RouteId, StopId};

use super::context::LayoutContext;
use super::major::select_major_names;
use super::ordering::natural_cmp;
use super::types::SelectedRoute;

/// Collect, filter, rank and truncate the routes passing the selected stop.
pub fn select_routes<'a>(
    sources: &DataSources<'a>,
    ctx: &LayoutContext<'_>,
    options: &DiagramOptions,
) -> Vec<SelectedRoute<'a>> {
    let candidates = sources.routes.routes_through(&ctx.selected);
    let mut seen: HashSet<(RouteId, StopId)> = HashSet::new();
    let mut selected: Vec<(SelectedRoute<'a>, f64)> = Vec::new();

    for route in candidates {
        if !route.passes(&ctx.selected) {
            continue;
        }
        if !seen.insert((route.route_id.clone(), route.destination.clone())) {
            tracing::trace!(route = %route.route_id, "skipping further variant");
            continue;
        }

        let (forward, names) = forward_names(sources, ctx, route);
        if ends_here(&names[1..], options.target_major_stops, ctx.config.significance_ratio) {
            tracing::debug!(route = %route.route_id, "stop is the terminus, excluded");
            continue;
        }

        let destination_score = sources.ranking.score(&route.destination);
        selected.push((
            SelectedRoute {
                route,
                forward,
                names,
                trip_count: sources.trips.trip_count(route),
            },
            destination_score,
        ));
    }

    selected.sort_by(|(a, sa), (b, sb)| {
        b.trip_count
            .cmp(&a.trip_count)
            .then_with(|| sb.total_cmp(sa))
            .then_with(|| natural_cmp(a.route.route_id.as_str(), b.route.route_id.as_str()))
            .then_with(|| natural_cmp(a.route.destination.as_str(), b.route.destination.as_str()))
    });
    selected.truncate(options.max_routes.max(1));

    tracing::debug!(kept = selected.len(), "routes selected");
    selected.into_iter().map(|(route, _)| route).collect()
}

/// Forward sequence from the selected stop with each name kept once.
/// Later calls at the selected stop's own name are dropped.
fn forward_names(
    sources: &DataSources<'_>,
    ctx: &LayoutContext<'_>,
    route: &Route,
) -> (Vec<StopId>, Vec<Arc<str>>) {
    let forward = route.forward_from(&ctx.selected);
    let mut ids = vec![ctx.selected.clone()];
    let mut names = vec![ctx.selected_name.clone()];
    let mut seen: HashSet<Arc<str>> = HashSet::from([ctx.selected_name.clone()]);

    for id in forward.iter().skip(1) {
        let name = sources.stop_name(id);
        if seen.insert(name.clone()) {
            ids.push(id.clone());
            names.push(name);
        }
    }
    (ids, names)
}

/// A route ends here when major-stop selection over its onward stops alone
/// leaves nothing to draw.
fn ends_here(onward: &[Arc<str>], target: usize, significance_ratio: f64) -> bool {
    select_major_names(&[onward], &HashMap::new(), target, significance_ratio).is_empty()
}

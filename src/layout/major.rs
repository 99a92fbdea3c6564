//! Major-stop selection: which onward stops each route displays.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::catalog::RankingSource;

use super::types::{DisplayedRoute, SelectedRoute};

/// Ranking per stop name: the best score of any stop id with that name.
pub fn name_scores(routes: &[SelectedRoute<'_>], ranking: &dyn RankingSource) -> HashMap<Arc<str>, f64> {
    let mut scores: HashMap<Arc<str>, f64> = HashMap::new();
    for route in routes {
        for (id, name) in route.onward_ids().iter().zip(route.onward()) {
            let score = ranking.score(id).max(0.0);
            let entry = scores.entry(name.clone()).or_insert(score);
            if score > *entry {
                *entry = score;
            }
        }
    }
    scores
}

/// Pick the names to display, pooled over all routes.
///
/// Kept unconditionally: every route's terminal and every name scoring at
/// least `significance_ratio` of the best score. Then each route, in order,
/// is topped up with its best-ranked remaining names until it shows
/// `target` onward names or runs out.
pub fn select_major_names(
    onward: &[&[Arc<str>]],
    scores: &HashMap<Arc<str>, f64>,
    target: usize,
    significance_ratio: f64,
) -> HashSet<Arc<str>> {
    let mut keep: HashSet<Arc<str>> = HashSet::new();
    let score = |name: &Arc<str>| scores.get(name).copied().unwrap_or(0.0);

    for names in onward {
        if let Some(terminal) = names.last() {
            keep.insert(terminal.clone());
        }
    }

    let best = onward
        .iter()
        .flat_map(|names| names.iter())
        .map(score)
        .fold(0.0, f64::max);
    if best > 0.0 {
        let threshold = best * significance_ratio;
        for names in onward {
            for name in names.iter() {
                if score(name) >= threshold {
                    keep.insert(name.clone());
                }
            }
        }
    }

    for names in onward {
        let shown = names.iter().filter(|n| keep.contains(*n)).count();
        if shown >= target {
            continue;
        }
        let mut rest: Vec<&Arc<str>> = names.iter().filter(|n| !keep.contains(*n)).collect();
        // stable: equal scores keep sequence order
        rest.sort_by(|a, b| score(*b).total_cmp(&score(*a)));
        for name in rest.into_iter().take(target - shown) {
            keep.insert(name.clone());
        }
    }

    keep
}

/// Order-preserving subsequence of each route's onward stops limited to `keep`.
pub fn filter_routes(routes: &[SelectedRoute<'_>], keep: &HashSet<Arc<str>>) -> Vec<DisplayedRoute> {
    routes
        .iter()
        .map(|route| {
            let (stops, names) = route
                .onward_ids()
                .iter()
                .zip(route.onward())
                .filter(|(_, name)| keep.contains(*name))
                .map(|(id, name)| (id.clone(), name.clone()))
                .unzip();
            DisplayedRoute { stops, names }
        })
        .collect()
}

//! Stop importance derived from route stop sequences.
//!
//! A stop scores high when it reaches many destinations compared with its
//! immediate neighbours, which is what makes a stop an interchange.

use std::collections::{HashMap, HashSet};

use crate::model::{Route, StopId};

const RATIO_WEIGHT: f64 = 0.8;
const UNIQUE_WEIGHT: f64 = 0.2;

/// Score every stop that has at least one onward destination, normalised
/// to `0..=100` and rounded to two decimals.
pub fn rank_stops(routes: &[Route]) -> HashMap<StopId, f64> {
    let mut destinations: HashMap<&StopId, HashSet<&StopId>> = HashMap::new();
    let mut neighbours: HashMap<&StopId, HashSet<&StopId>> = HashMap::new();

    for route in routes {
        let stops = &route.stops;
        for (i, stop) in stops.iter().enumerate() {
            if i + 1 < stops.len() {
                destinations.entry(stop).or_default().extend(&stops[i + 1..]);
            }
            let adjacent = [i.checked_sub(1), Some(i + 1)];
            for j in adjacent.into_iter().flatten() {
                if let Some(other) = stops.get(j).filter(|o| *o != stop) {
                    neighbours.entry(stop).or_default().insert(other);
                }
            }
        }
    }

    let raw: Vec<(&StopId, f64)> = destinations
        .iter()
        .map(|(&stop, dests)| (stop, importance(stop, dests, &destinations, &neighbours)))
        .collect();
    tracing::debug!(stops = raw.len(), "stop importance computed");
    normalize(raw)
}

fn importance(
    stop: &StopId,
    dests: &HashSet<&StopId>,
    destinations: &HashMap<&StopId, HashSet<&StopId>>,
    neighbours: &HashMap<&StopId, HashSet<&StopId>>,
) -> f64 {
    let count = dests.len() as f64;
    let Some(near) = neighbours.get(stop).filter(|n| !n.is_empty()) else {
        return count;
    };

    let mut total = 0usize;
    let mut reachable: HashSet<&StopId> = HashSet::new();
    for n in near {
        if let Some(d) = destinations.get(n) {
            total += d.len();
            reachable.extend(d);
        }
    }
    let mean = total as f64 / near.len() as f64;
    let ratio = if mean > 0.0 { count / mean } else { count };
    let unique = dests.iter().filter(|d| !reachable.contains(*d)).count() as f64;

    RATIO_WEIGHT * ratio + UNIQUE_WEIGHT * unique
}

fn normalize(raw: Vec<(&StopId, f64)>) -> HashMap<StopId, f64> {
    let min = raw.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
    let max = raw.iter().map(|(_, s)| *s).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    raw.into_iter()
        .map(|(stop, score)| {
            let scaled = if range > 0.0 { 100.0 * (score - min) / range } else { 50.0 };
            (stop.clone(), (scaled * 100.0).round() / 100.0)
        })
        .collect()
}

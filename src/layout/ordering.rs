//! Route ordering.
//!
//! Routes are sorted so that those sharing many forward stops at the same
//! relative position end up adjacent, which is what lets markers merge
//! across contiguous rows. The comparator is greedy: it maximises adjacent
//! commonality, not global crossing count.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{RouteId, StopId};

use super::types::SelectedRoute;

/// Per forward index, how many routes have each stop name there.
/// Index 0 (the selected stop) is always empty.
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    columns: Vec<HashMap<Arc<str>, usize>>,
}

impl FrequencyTable {
    pub fn build<'n, I>(sequences: I) -> Self
    where
        I: IntoIterator<Item = &'n [Arc<str>]>,
    {
        let mut columns: Vec<HashMap<Arc<str>, usize>> = Vec::new();
        for names in sequences {
            if columns.len() < names.len() {
                columns.resize_with(names.len(), HashMap::new);
            }
            for (idx, name) in names.iter().enumerate().skip(1) {
                *columns[idx].entry(name.clone()).or_insert(0) += 1;
            }
        }
        Self { columns }
    }

    pub fn frequency(&self, index: usize, name: Option<&str>) -> usize {
        match name {
            Some(name) => self
                .columns
                .get(index)
                .and_then(|c| c.get(name))
                .copied()
                .unwrap_or(0),
            None => 0,
        }
    }
}

/// The parts of a route the comparator looks at.
#[derive(Debug, Clone, Copy)]
pub struct OrderKey<'a> {
    pub names: &'a [Arc<str>],
    pub route_id: &'a RouteId,
    pub destination: &'a StopId,
}

impl<'a> OrderKey<'a> {
    pub fn of(route: &'a SelectedRoute<'_>) -> Self {
        Self {
            names: &route.names,
            route_id: &route.route.route_id,
            destination: &route.route.destination,
        }
    }
}

/// Compare two routes at their first differing forward index: the name
/// shared by more routes sorts first, then the lexically smaller name. A
/// route that has already ended sorts after one that continues. Identical
/// sequences fall back to the route identifier and destination.
pub fn compare_routes(a: &OrderKey<'_>, b: &OrderKey<'_>, table: &FrequencyTable) -> Ordering {
    let len = a.names.len().max(b.names.len());
    for idx in 1..len {
        let na = a.names.get(idx);
        let nb = b.names.get(idx);
        if na == nb {
            continue;
        }

        let fa = table.frequency(idx, na.map(|n| &**n));
        let fb = table.frequency(idx, nb.map(|n| &**n));
        return fb.cmp(&fa).then_with(|| match (na, nb) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }

    natural_cmp(a.route_id.as_str(), b.route_id.as_str())
        .then_with(|| natural_cmp(a.destination.as_str(), b.destination.as_str()))
}

/// Sort routes in place so heavily overlapping ones are adjacent.
pub fn order_routes(routes: &mut [SelectedRoute<'_>]) {
    let table = FrequencyTable::build(routes.iter().map(|r| r.names.as_slice()));
    routes.sort_by(|a, b| compare_routes(&OrderKey::of(a), &OrderKey::of(b), &table));
}

/// Compare strings treating digit runs as numbers, so "9" < "10" < "10A".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = chunks(a);
    let mut cb = chunks(b);
    loop {
        match (ca.next(), cb.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (is_digits(x), is_digits(y)) {
                    (true, true) => {
                        let x = x.trim_start_matches('0');
                        let y = y.trim_start_matches('0');
                        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
                    }
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Split into maximal runs of ASCII digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digit)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

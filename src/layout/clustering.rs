//! Similarity clusters and name tagging.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::diagram::NameKind;

use super::types::{Clusters, DisplayedRoute, NameTags};

/// Shared names over the union of names of two sequences.
pub fn jaccard(a: &[Arc<str>], b: &[Arc<str>]) -> f64 {
    let sa: HashSet<&str> = a.iter().map(|n| &**n).collect();
    let sb: HashSet<&str> = b.iter().map(|n| &**n).collect();
    let union = sa.union(&sb).count();
    if union == 0 {
        return 0.0;
    }
    sa.intersection(&sb).count() as f64 / union as f64
}

/// Union routes transitively whenever their onward sequences reach
/// `threshold` similarity. Clusters are numbered by their lowest route index.
pub fn cluster_routes(onward: &[&[Arc<str>]], threshold: f64) -> Clusters {
    let n = onward.len();
    let mut parent: Vec<usize> = (0..n).collect();

    for i in 0..n {
        for j in (i + 1)..n {
            if jaccard(onward[i], onward[j]) >= threshold {
                union(&mut parent, i, j);
            }
        }
    }

    let mut cluster_of = vec![0; n];
    let mut members: Vec<Vec<usize>> = Vec::new();
    let mut root_cluster: HashMap<usize, usize> = HashMap::new();
    for (route, slot) in cluster_of.iter_mut().enumerate() {
        let root = find(&mut parent, route);
        let cluster = *root_cluster.entry(root).or_insert_with(|| {
            members.push(Vec::new());
            members.len() - 1
        });
        members[cluster].push(route);
        *slot = cluster;
    }

    Clusters {
        cluster_of,
        members,
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        // keep the smaller index as root
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}

/// Classify every displayed name by how widely it is shared.
pub fn tag_names(routes: &[DisplayedRoute], clusters: &Clusters) -> NameTags {
    let mut tags = NameTags::default();

    for (route_idx, route) in routes.iter().enumerate() {
        for name in &route.names {
            let carriers = tags.carriers.entry(name.clone()).or_default();
            if carriers.is_empty() {
                tags.order.push(name.clone());
            }
            if carriers.last() != Some(&route_idx) {
                carriers.push(route_idx);
            }
        }
    }

    for name in &tags.order {
        let carriers = &tags.carriers[name];
        let kind = if carriers.len() == routes.len() {
            NameKind::Universal
        } else if carriers.len() >= 2 {
            let first = clusters.cluster_of[carriers[0]];
            if carriers.iter().all(|&r| clusters.cluster_of[r] == first) {
                NameKind::GroupLocal
            } else {
                NameKind::CrossGroup
            }
        } else {
            NameKind::RouteLocal
        };
        tags.kinds.insert(name.clone(), kind);
    }

    tags
}

//! Stop position engine.
//!
//! Names are placed tier by tier (universal, cross-group, group-local,
//! route-local) so that widely shared names claim space first and local
//! names interpolate between them. A final pass puts every name into one
//! sequence consistent with all routes, enforces the minimum separation
//! along it and stretches the result over the usable width.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::diagram::{NameKind, NamePosition};

use super::context::LayoutContext;
use super::types::{Clusters, DisplayedRoute, NameTags};

const EPS: f64 = 1e-9;

/// Assign one x position to every displayed name.
///
/// Returns the names in left-to-right sequence order; the context ends up
/// holding the same final positions.
pub fn assign_positions(
    ctx: &mut LayoutContext<'_>,
    routes: &[DisplayedRoute],
    tags: &NameTags,
    clusters: &Clusters,
) -> Vec<NamePosition> {
    if tags.order.is_empty() {
        return Vec::new();
    }

    place_universal(ctx, routes, tags);

    let no_priority = vec![0.0; tags.order.len()];
    let base = sequence(&tags.order, routes, &no_priority);

    for name in shared_claim_order(tags, clusters, &base) {
        place_shared(ctx, routes, tags, name);
    }

    for route in routes {
        place_route_local(ctx, route, tags);
    }

    tracing::debug!(names = ctx.placed_count(), "tiers placed");
    finalize(ctx, routes, tags)
}

/// Names shared by several routes in the order they claim space: cross-group
/// names first since they bridge clusters, then each cluster's group-local
/// names. Both follow the base sequence.
fn shared_claim_order<'t>(tags: &'t NameTags, clusters: &Clusters, base: &[usize]) -> Vec<&'t Arc<str>> {
    let mut order: Vec<&Arc<str>> = base
        .iter()
        .map(|&idx| &tags.order[idx])
        .filter(|name| tags.kind(name) == Some(NameKind::CrossGroup))
        .collect();
    for members in &clusters.members {
        for &idx in base {
            let name = &tags.order[idx];
            if tags.kind(name) == Some(NameKind::GroupLocal)
                && tags.carriers(name).first().is_some_and(|r| members.contains(r))
            {
                order.push(name);
            }
        }
    }
    order
}

/// Even spread of index `i` of `m` over the usable width.
fn even(ctx: &LayoutContext<'_>, i: usize, m: usize) -> f64 {
    let lo = ctx.config.lo();
    if m <= 1 {
        return lo;
    }
    lo + ctx.config.usable_width() * i as f64 / (m - 1) as f64
}

fn place_universal(ctx: &mut LayoutContext<'_>, routes: &[DisplayedRoute], tags: &NameTags) {
    let names: Vec<Arc<str>> = tags.names_of_kind(NameKind::Universal).cloned().collect();
    if names.is_empty() {
        return;
    }

    let desired: Vec<f64> = names
        .iter()
        .map(|name| {
            let total: f64 = routes
                .iter()
                .filter_map(|r| r.index_of(name).map(|i| even(ctx, i, r.len())))
                .sum();
            total / routes.len() as f64
        })
        .collect();

    let cfg = ctx.config;
    let placed = spread(&desired, cfg.lo(), cfg.hi(), cfg.min_spacing);
    tracing::debug!(count = names.len(), "universal names");
    for (name, p) in names.into_iter().zip(placed) {
        ctx.register(name, p);
    }
}

/// Place a name shared by several routes at the mean of its anchored
/// positions on each carrier.
fn place_shared(ctx: &mut LayoutContext<'_>, routes: &[DisplayedRoute], tags: &NameTags, name: &Arc<str>) {
    let carriers = tags.carriers(name);
    let desired: Vec<f64> = carriers
        .iter()
        .filter_map(|&r| routes[r].index_of(name).map(|i| anchored(ctx, &routes[r], i)))
        .collect();
    if desired.is_empty() {
        return;
    }
    let mean = desired.iter().sum::<f64>() / desired.len() as f64;
    ctx.claim(name.clone(), mean);
}

fn place_route_local(ctx: &mut LayoutContext<'_>, route: &DisplayedRoute, tags: &NameTags) {
    let unanchored = !route.names.iter().any(|n| ctx.is_placed(n));
    if unanchored {
        tracing::debug!(stops = route.len(), "route without anchors, spreading evenly");
    }

    for (i, name) in route.names.iter().enumerate() {
        if ctx.is_placed(name) || tags.kind(name) != Some(NameKind::RouteLocal) {
            continue;
        }
        let desired = if unanchored {
            even(ctx, i, route.len())
        } else {
            anchored(ctx, route, i)
        };
        ctx.claim(name.clone(), desired);
    }
}

/// Desired position of the `i`th name of `route` from its nearest placed
/// neighbours on either side.
fn anchored(ctx: &LayoutContext<'_>, route: &DisplayedRoute, i: usize) -> f64 {
    let cfg = ctx.config;
    let prev = route.names[..i]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(j, n)| ctx.position(n).map(|p| (j, p)));
    let next = route.names[i + 1..]
        .iter()
        .enumerate()
        .find_map(|(k, n)| ctx.position(n).map(|p| (i + 1 + k, p)));

    let desired = match (prev, next) {
        (Some((ja, pa)), Some((jb, pb))) => pa + (pb - pa) * (i - ja) as f64 / (jb - ja) as f64,
        (Some((ja, pa)), None) => pa + (i - ja) as f64 * cfg.minor_spacing,
        (None, Some((jb, pb))) => pb - (jb - i) as f64 * cfg.minor_spacing,
        (None, None) => even(ctx, i, route.len()),
    };
    desired.clamp(cfg.lo(), cfg.hi())
}

/// Order `names` (indices into the slice) so that every route's consecutive
/// displayed names appear in travel order. Among the names free to go next,
/// the smallest `priority` wins, then the earliest appearance. Contradicting
/// routes form cycles; those are broken at the smallest priority.
fn sequence(names: &[Arc<str>], routes: &[DisplayedRoute], priority: &[f64]) -> Vec<usize> {
    let n = names.len();
    let index: HashMap<&str, usize> = names.iter().enumerate().map(|(i, s)| (&**s, i)).collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    let mut edges: HashSet<(usize, usize)> = HashSet::new();
    for route in routes {
        for pair in route.names.windows(2) {
            let (Some(&a), Some(&b)) = (index.get(&*pair[0]), index.get(&*pair[1])) else {
                continue;
            };
            if a != b && edges.insert((a, b)) {
                successors[a].push(b);
                in_degree[b] += 1;
            }
        }
    }

    let key = |i: usize| (priority[i], i);
    let before = |a: usize, b: usize| {
        let (pa, ra) = key(a);
        let (pb, rb) = key(b);
        pa.total_cmp(&pb).then(ra.cmp(&rb)).is_lt()
    };

    let mut done = vec![false; n];
    let mut order = Vec::with_capacity(n);
    for _ in 0..n {
        let mut pick: Option<usize> = None;
        for i in (0..n).filter(|&i| !done[i] && in_degree[i] == 0) {
            if pick.is_none_or(|p| before(i, p)) {
                pick = Some(i);
            }
        }
        let next = match pick {
            Some(i) => i,
            None => {
                let mut forced: Option<usize> = None;
                for i in (0..n).filter(|&i| !done[i]) {
                    if forced.is_none_or(|p| before(i, p)) {
                        forced = Some(i);
                    }
                }
                let Some(i) = forced else { break };
                tracing::debug!(name = %names[i], "route orders disagree, breaking cycle");
                i
            }
        };
        done[next] = true;
        order.push(next);
        for &s in &successors[next] {
            in_degree[s] = in_degree[s].saturating_sub(1);
        }
    }
    order
}

/// Forward then backward pass: ascending, `min` apart, within `[lo, hi]`.
/// Assumes `(n - 1) * min` fits in the range.
fn separate(desired: &[f64], lo: f64, hi: f64, min: f64) -> Vec<f64> {
    let mut p: Vec<f64> = Vec::with_capacity(desired.len());
    for (k, &d) in desired.iter().enumerate() {
        let floor = if k == 0 { lo } else { p[k - 1] + min };
        p.push(d.max(floor));
    }
    let mut ceiling = hi;
    for v in p.iter_mut().rev() {
        *v = v.min(ceiling);
        ceiling = *v - min;
    }
    p
}

fn fits(n: usize, lo: f64, hi: f64, min: f64) -> bool {
    n.saturating_sub(1) as f64 * min <= (hi - lo) + EPS
}

/// Like [`separate`], but compresses evenly when the names do not fit.
fn spread(desired: &[f64], lo: f64, hi: f64, min: f64) -> Vec<f64> {
    let n = desired.len();
    if fits(n, lo, hi, min) {
        return separate(desired, lo, hi, min);
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|k| lo + step * k as f64).collect()
}

fn finalize(ctx: &mut LayoutContext<'_>, routes: &[DisplayedRoute], tags: &NameTags) -> Vec<NamePosition> {
    let cfg = ctx.config;
    let (lo, hi, min) = (cfg.lo(), cfg.hi(), cfg.min_spacing);

    let placed: Vec<f64> = tags
        .order
        .iter()
        .map(|name| ctx.position(name).unwrap_or(lo))
        .collect();
    let order = sequence(&tags.order, routes, &placed);
    let desired: Vec<f64> = order.iter().map(|&i| placed[i]).collect();
    let n = order.len();

    let finals: Vec<f64> = if n == 1 {
        tracing::debug!("single displayed name, pinned to the left padding");
        vec![lo]
    } else if fits(n, lo, hi, min) {
        normalize(&separate(&desired, lo, hi, min), lo, hi)
    } else {
        tracing::debug!(names = n, "names exceed the width, clamping overflow");
        let slots = ((hi - lo) / min).floor() as usize + 1;
        (0..n)
            .map(|k| if k + 1 < slots { lo + k as f64 * min } else { hi })
            .collect()
    };

    let mut positions: HashMap<Arc<str>, f64> = HashMap::with_capacity(n);
    let mut result = Vec::with_capacity(n);
    for (&idx, &position) in order.iter().zip(&finals) {
        let name = &tags.order[idx];
        positions.insert(name.clone(), position);
        result.push(NamePosition {
            name: name.to_string(),
            position,
            kind: tags.kind(name).unwrap_or(NameKind::RouteLocal),
        });
    }
    ctx.replace_positions(positions);
    result
}

/// Shift and stretch ascending positions so the first sits at `lo` and the
/// last at `hi`. Never shrinks, so separation survives.
fn normalize(p: &[f64], lo: f64, hi: f64) -> Vec<f64> {
    let (Some(&first), Some(&last)) = (p.first(), p.last()) else {
        return Vec::new();
    };
    let span = last - first;
    if span <= EPS {
        return vec![lo; p.len()];
    }
    let scale = (hi - lo) / span;
    let mut out: Vec<f64> = p.iter().map(|v| lo + (v - first) * scale).collect();
    if let Some(v) = out.first_mut() {
        *v = lo;
    }
    if let Some(v) = out.last_mut() {
        *v = hi;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::layout::clustering::{cluster_routes, tag_names};
    use crate::measure::TextMetrics;

    fn displayed(list: &[&str]) -> DisplayedRoute {
        DisplayedRoute {
            stops: list.iter().map(|s| (*s).into()).collect(),
            names: list.iter().map(|s| Arc::from(*s)).collect(),
        }
    }

    fn layout(config: &LayoutConfig, routes: &[DisplayedRoute]) -> Vec<NamePosition> {
        let metrics = TextMetrics::default();
        let mut ctx = LayoutContext::new(config, &metrics, "s".into(), "S".into());
        let onward: Vec<&[Arc<str>]> = routes.iter().map(|r| r.names.as_slice()).collect();
        let clusters = cluster_routes(&onward, config.similarity_threshold);
        let tags = tag_names(routes, &clusters);
        assign_positions(&mut ctx, routes, &tags, &clusters)
    }

    fn pos(result: &[NamePosition], name: &str) -> f64 {
        result.iter().find(|n| n.name == name).map(|n| n.position).unwrap()
    }

    #[test]
    fn test_single_route_fills_width() {
        let config = LayoutConfig::default();
        let result = layout(&config, &[displayed(&["B", "C"])]);
        assert_eq!(pos(&result, "B"), config.lo());
        assert_eq!(pos(&result, "C"), config.hi());
    }

    #[test]
    fn test_single_name_pinned_left() {
        let config = LayoutConfig::default();
        let result = layout(&config, &[displayed(&["B"])]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].position, config.lo());
    }

    #[test]
    fn test_diverging_routes_interleave_without_collisions() {
        let config = LayoutConfig::default();
        let result = layout(&config, &[displayed(&["B", "C", "D"]), displayed(&["B", "E", "F"])]);
        assert_eq!(result[0].name, "B");
        assert_eq!(result[0].kind, NameKind::Universal);
        let b = pos(&result, "B");
        for name in ["C", "D", "E", "F"] {
            assert!(pos(&result, name) > b, "{name} after B");
        }
        assert!(pos(&result, "C") < pos(&result, "D"));
        assert!(pos(&result, "E") < pos(&result, "F"));
        for (i, a) in result.iter().enumerate() {
            for other in &result[i + 1..] {
                assert!((a.position - other.position).abs() >= config.min_spacing - 1e-6);
            }
        }
    }

    #[test]
    fn test_route_order_is_respected_across_tiers() {
        let config = LayoutConfig::default();
        let routes = [
            displayed(&["B", "X", "C", "D"]),
            displayed(&["B", "C", "Y", "D"]),
            displayed(&["B", "Z", "D"]),
        ];
        let result = layout(&config, &routes);
        for route in &routes {
            let ps: Vec<f64> = route.names.iter().map(|n| pos(&result, n)).collect();
            assert!(ps.windows(2).all(|w| w[0] <= w[1]), "{ps:?}");
        }
    }

    #[test]
    fn test_overflow_clamps_at_right_padding() {
        let config = LayoutConfig {
            min_spacing: 30.0,
            ..LayoutConfig::default()
        };
        let result = layout(&config, &[displayed(&["A", "B", "C", "D", "E", "F"])]);
        let ps: Vec<f64> = result.iter().map(|n| n.position).collect();
        assert_eq!(&ps[..3], &[6.0, 36.0, 66.0]);
        assert!(ps[3..].iter().all(|&p| p == config.hi()));
    }

    #[test]
    fn test_spread_compresses_when_too_tight() {
        let ps = spread(&[0.0, 0.0, 0.0], 0.0, 4.0, 3.0);
        assert_eq!(ps, vec![0.0, 2.0, 4.0]);
        let ps = spread(&[10.0, 11.0, 50.0], 0.0, 100.0, 3.0);
        assert_eq!(ps, vec![10.0, 13.0, 50.0]);
    }

    #[test]
    fn test_sequence_breaks_cycles() {
        let names: Vec<Arc<str>> = ["A", "B"].iter().map(|s| Arc::from(*s)).collect();
        let routes = [displayed(&["A", "B"]), displayed(&["B", "A"])];
        let order = sequence(&names, &routes, &[5.0, 1.0]);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_cross_group_names_claim_before_group_local() {
        let config = LayoutConfig::default();
        let metrics = TextMetrics::default();
        // two clusters, {0, 1} and {2, 3}, bridged only by X
        let routes = [
            displayed(&["A", "B", "X", "C"]),
            displayed(&["A", "B", "D"]),
            displayed(&["E", "F", "X", "G"]),
            displayed(&["E", "F", "H"]),
        ];
        let onward: Vec<&[Arc<str>]> = routes.iter().map(|r| r.names.as_slice()).collect();
        let clusters = cluster_routes(&onward, config.similarity_threshold);
        let tags = tag_names(&routes, &clusters);
        assert_eq!(clusters.members, vec![vec![0, 1], vec![2, 3]]);
        assert_eq!(tags.kind("X"), Some(NameKind::CrossGroup));
        assert_eq!(tags.kind("A"), Some(NameKind::GroupLocal));
        assert_eq!(tags.kind("F"), Some(NameKind::GroupLocal));

        let base = sequence(&tags.order, &routes, &vec![0.0; tags.order.len()]);
        let claim_order: Vec<&str> = shared_claim_order(&tags, &clusters, &base)
            .into_iter()
            .map(|n| &**n)
            .collect();
        assert_eq!(claim_order, vec!["X", "A", "B", "E", "F"]);

        let mut ctx = LayoutContext::new(&config, &metrics, "s".into(), "S".into());
        for name in shared_claim_order(&tags, &clusters, &base) {
            place_shared(&mut ctx, &routes, &tags, name);
        }
        // X sits at the even spot of index 2 of 4; A and B interpolate toward it
        let close = |name: &str, expected: f64| (ctx.position(name).unwrap() - expected).abs() < 1e-9;
        assert!(close("X", 66.0));
        assert!(close("A", 30.0));
        assert!(close("B", 42.0));

        let result = layout(&config, &routes);
        assert!(pos(&result, "B") < pos(&result, "X") && pos(&result, "X") < pos(&result, "C"));
        assert!(pos(&result, "F") < pos(&result, "X") && pos(&result, "X") < pos(&result, "G"));
    }
}

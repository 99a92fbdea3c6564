//! Marker spans and label placement.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::diagram::{Label, Marker, MarkerKind, NamePosition};

use super::context::LayoutContext;
use super::types::{LabelEntry, NameTags};

/// Split ascending row indices into contiguous `(start, end)` runs.
pub fn runs(rows: &[usize]) -> Vec<(usize, usize)> {
    let mut out: Vec<(usize, usize)> = Vec::new();
    for &row in rows {
        match out.last_mut() {
            Some((_, end)) if *end + 1 == row => *end = row,
            _ => out.push((row, row)),
        }
    }
    out
}

fn marker_kind(start: usize, end: usize) -> MarkerKind {
    if start == end {
        MarkerKind::Single
    } else {
        MarkerKind::Merged
    }
}

/// The origin marker spanning every row, then one marker per name per run.
pub fn build_markers(
    ctx: &LayoutContext<'_>,
    names: &[NamePosition],
    tags: &NameTags,
    row_count: usize,
) -> Vec<Marker> {
    let last_row = row_count.saturating_sub(1);
    let mut markers = vec![Marker {
        kind: marker_kind(0, last_row),
        name: ctx.selected_name.to_string(),
        x: ctx.config.origin_x,
        route_row_start: 0,
        route_row_end: last_row,
    }];

    for entry in names {
        for (start, end) in runs(tags.carriers(&entry.name)) {
            markers.push(Marker {
                kind: marker_kind(start, end),
                name: entry.name.clone(),
                x: entry.position,
                route_row_start: start,
                route_row_end: end,
            });
        }
    }
    markers
}

/// Natural anchors: one per name per run, above the run's top row and
/// lifted further for long rotated text.
pub fn default_labels(ctx: &LayoutContext<'_>, names: &[NamePosition], tags: &NameTags) -> Vec<LabelEntry> {
    let cfg = ctx.config;
    let mut labels = Vec::new();
    for entry in names {
        let text: Arc<str> = entry.name.as_str().into();
        let footprint = ctx.metrics.footprint(&text, cfg.label_rotation);
        for (start, end) in runs(tags.carriers(&entry.name)) {
            let y = cfg.row_y(start) - (cfg.label_offset + cfg.label_lift * footprint.height);
            labels.push(LabelEntry {
                text: text.clone(),
                x: entry.position,
                y,
                natural_x: entry.position,
                row_start: start,
                row_end: end,
                footprint,
            });
        }
    }
    labels
}

fn by_x(a: &LabelEntry, b: &LabelEntry) -> Ordering {
    a.x.total_cmp(&b.x)
        .then(a.y.total_cmp(&b.y))
        .then_with(|| a.text.cmp(&b.text))
}

/// Push labels right past earlier overlapping ones, within the drift bound.
pub fn resolve_horizontal(ctx: &LayoutContext<'_>, labels: &mut [LabelEntry]) {
    let cfg = ctx.config;
    labels.sort_by(by_x);
    for i in 1..labels.len() {
        let (placed, rest) = labels.split_at_mut(i);
        let label = &mut rest[0];
        let needed = placed
            .iter()
            .filter(|prev| prev.overlaps_vertically(label))
            .map(|prev| prev.right() + cfg.label_gap)
            .fold(label.x, f64::max);
        let bounded = needed.clamp(label.natural_x - cfg.max_drift, label.natural_x + cfg.max_drift);
        if bounded != label.x {
            tracing::trace!(text = %label.text, from = label.x, to = bounded, "label pushed");
            label.x = bounded;
        }
    }
}

/// Push the lower of two stacked labels down until they clear each other.
pub fn resolve_vertical(ctx: &LayoutContext<'_>, labels: &mut [LabelEntry]) {
    let cfg = ctx.config;
    labels.sort_by(by_x);
    for j in 1..labels.len() {
        for i in 0..j {
            let (head, tail) = labels.split_at_mut(j);
            let (a, b) = (&mut head[i], &mut tail[0]);
            if (a.x - b.x).abs() >= cfg.stack_tolerance || (a.y - b.y).abs() >= cfg.label_min_vertical {
                continue;
            }
            if b.y >= a.y {
                b.y = a.y + cfg.label_min_vertical;
            } else {
                a.y = b.y + cfg.label_min_vertical;
            }
        }
    }
}

/// Full label pass: defaults, horizontal then vertical resolution.
pub fn place_labels(ctx: &LayoutContext<'_>, names: &[NamePosition], tags: &NameTags) -> Vec<Label> {
    let mut labels = default_labels(ctx, names, tags);
    resolve_horizontal(ctx, &mut labels);
    resolve_vertical(ctx, &mut labels);
    tracing::debug!(labels = labels.len(), "labels placed");

    labels
        .into_iter()
        .map(|l| Label {
            text: l.text.to_string(),
            x: l.x,
            y: l.y,
            rotation: ctx.config.label_rotation,
            row_start: l.row_start,
            row_end: l.row_end,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutConfig;
    use crate::diagram::NameKind;
    use crate::measure::{Footprint, TextMetrics};

    fn entry(text: &str, x: f64, y: f64, width: f64) -> LabelEntry {
        LabelEntry {
            text: Arc::from(text),
            x,
            y,
            natural_x: x,
            row_start: 0,
            row_end: 0,
            footprint: Footprint { width, height: 2.0 },
        }
    }

    fn tags(carriers: &[(&str, &[usize])]) -> NameTags {
        let mut tags = NameTags::default();
        for (name, rows) in carriers {
            let name: Arc<str> = Arc::from(*name);
            tags.order.push(name.clone());
            tags.kinds.insert(name.clone(), NameKind::GroupLocal);
            tags.carriers.insert(name, rows.to_vec());
        }
        tags
    }

    fn named(name: &str, position: f64) -> NamePosition {
        NamePosition {
            name: name.to_string(),
            position,
            kind: NameKind::GroupLocal,
        }
    }

    #[test]
    fn test_runs() {
        assert_eq!(runs(&[0, 1, 2]), vec![(0, 2)]);
        assert_eq!(runs(&[0, 2, 3, 5]), vec![(0, 0), (2, 3), (5, 5)]);
        assert!(runs(&[]).is_empty());
    }

    #[test]
    fn test_markers_split_on_gaps() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let ctx = LayoutContext::new(&config, &metrics, "s".into(), "Hub".into());
        let tags = tags(&[("P", &[0, 1, 3])]);
        let markers = build_markers(&ctx, &[named("P", 40.0)], &tags, 4);

        assert_eq!(markers.len(), 3);
        assert_eq!(markers[0].name, "Hub");
        assert_eq!(markers[0].kind, MarkerKind::Merged);
        assert_eq!((markers[0].route_row_start, markers[0].route_row_end), (0, 3));
        assert_eq!(markers[0].x, config.origin_x);
        assert_eq!(markers[1].kind, MarkerKind::Merged);
        assert_eq!((markers[1].route_row_start, markers[1].route_row_end), (0, 1));
        assert_eq!(markers[2].kind, MarkerKind::Single);
        assert_eq!(markers[2].route_row_start, 3);
    }

    #[test]
    fn test_single_row_origin_is_single() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let ctx = LayoutContext::new(&config, &metrics, "s".into(), "Hub".into());
        let markers = build_markers(&ctx, &[], &NameTags::default(), 1);
        assert_eq!(markers[0].kind, MarkerKind::Single);
    }

    #[test]
    fn test_default_label_sits_above_top_row() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let ctx = LayoutContext::new(&config, &metrics, "s".into(), "Hub".into());
        let tags = tags(&[("Short", &[1, 2]), ("A much longer name", &[1])]);
        let labels = default_labels(&ctx, &[named("Short", 20.0), named("A much longer name", 50.0)], &tags);

        assert_eq!(labels.len(), 2);
        assert!(labels[0].y < config.row_y(1));
        assert!(labels[1].y < labels[0].y);
        assert_eq!(labels[0].x, 20.0);
    }

    #[test]
    fn test_horizontal_push_is_bounded_by_drift() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let ctx = LayoutContext::new(&config, &metrics, "s".into(), "Hub".into());
        let mut labels = vec![entry("A", 10.0, 5.0, 3.0), entry("B", 11.0, 5.0, 10.0), entry("C", 12.0, 5.0, 3.0)];
        resolve_horizontal(&ctx, &mut labels);

        assert!((labels[1].x - (13.0 + config.label_gap)).abs() < 1e-9);
        // C would need 23.6 + gap but may only drift to 12 + 6
        assert_eq!(labels[2].x, 12.0 + config.max_drift);
    }

    #[test]
    fn test_labels_on_other_rows_do_not_push() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let ctx = LayoutContext::new(&config, &metrics, "s".into(), "Hub".into());
        let mut labels = vec![entry("A", 10.0, 5.0, 30.0), entry("B", 11.0, 40.0, 3.0)];
        resolve_horizontal(&ctx, &mut labels);
        assert_eq!(labels[1].x, 11.0);
    }

    #[test]
    fn test_vertical_stacking_pushes_lower_label_down() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let ctx = LayoutContext::new(&config, &metrics, "s".into(), "Hub".into());
        let mut labels = vec![entry("A", 10.0, 5.0, 3.0), entry("B", 10.5, 6.0, 3.0), entry("C", 30.0, 6.0, 3.0)];
        resolve_vertical(&ctx, &mut labels);

        assert_eq!(labels[0].y, 5.0);
        assert_eq!(labels[1].y, 5.0 + config.label_min_vertical);
        assert_eq!(labels[2].y, 6.0);
    }
}

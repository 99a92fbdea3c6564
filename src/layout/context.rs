//! Per-request layout state.
//!
//! A `LayoutContext` is built fresh for every diagram and dropped with it;
//! stages receive it explicitly instead of sharing module-level caches.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::LayoutConfig;
use crate::measure::TextMetrics;
use crate::model::StopId;

const EPS: f64 = 1e-9;

pub struct LayoutContext<'a> {
    pub config: &'a LayoutConfig,
    pub metrics: &'a TextMetrics,
    pub selected: StopId,
    pub selected_name: Arc<str>,
    positions: HashMap<Arc<str>, f64>,
    /// Every registered position, ascending.
    occupied: Vec<f64>,
}

impl<'a> LayoutContext<'a> {
    pub fn new(
        config: &'a LayoutConfig,
        metrics: &'a TextMetrics,
        selected: StopId,
        selected_name: Arc<str>,
    ) -> Self {
        Self {
            config,
            metrics,
            selected,
            selected_name,
            positions: HashMap::new(),
            occupied: Vec::new(),
        }
    }

    pub fn position(&self, name: &str) -> Option<f64> {
        self.positions.get(name).copied()
    }

    pub fn is_placed(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn placed_count(&self) -> usize {
        self.positions.len()
    }

    /// Record a position without collision checks.
    pub fn register(&mut self, name: Arc<str>, position: f64) {
        if let Some(old) = self.positions.insert(name, position) {
            if let Some(idx) = self.occupied.iter().position(|p| *p == old) {
                self.occupied.remove(idx);
            }
        }
        let idx = self.occupied.partition_point(|p| *p < position);
        self.occupied.insert(idx, position);
    }

    /// Place `name` at `desired`, shifted right past any position closer than
    /// `min_spacing` and clamped at the right padding. Returns the final
    /// position.
    pub fn claim(&mut self, name: Arc<str>, desired: f64) -> f64 {
        let lo = self.config.lo();
        let hi = self.config.hi();
        let min = self.config.min_spacing;

        let mut p = desired.clamp(lo, hi);
        for &q in &self.occupied {
            if (p - q).abs() < min - EPS {
                p = q + min;
            }
        }
        if p > hi {
            p = hi;
        }

        tracing::trace!(name = %name, desired, placed = p, "claim");
        self.register(name, p);
        p
    }

    /// Swap in the final, normalised positions.
    pub fn replace_positions(&mut self, positions: HashMap<Arc<str>, f64>) {
        let mut occupied: Vec<f64> = positions.values().copied().collect();
        occupied.sort_by(f64::total_cmp);
        self.positions = positions;
        self.occupied = occupied;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context<'a>(config: &'a LayoutConfig, metrics: &'a TextMetrics) -> LayoutContext<'a> {
        LayoutContext::new(config, metrics, "s0".into(), "Origin".into())
    }

    #[test]
    fn test_claim_keeps_free_position() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let mut ctx = context(&config, &metrics);
        assert_eq!(ctx.claim("A".into(), 40.0), 40.0);
        assert_eq!(ctx.position("A"), Some(40.0));
    }

    #[test]
    fn test_claim_shifts_right_past_neighbours() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let mut ctx = context(&config, &metrics);
        ctx.claim("A".into(), 40.0);
        ctx.claim("B".into(), 43.0);
        // 41 collides with A (40) and then with B (43)
        assert_eq!(ctx.claim("C".into(), 41.0), 46.0);
    }

    #[test]
    fn test_claim_clamps_at_right_padding() {
        let config = LayoutConfig::default();
        let hi = config.hi();
        let metrics = TextMetrics::default();
        let mut ctx = context(&config, &metrics);
        ctx.claim("A".into(), hi);
        assert_eq!(ctx.claim("B".into(), hi - 1.0), hi);
        assert_eq!(ctx.claim("C".into(), 500.0), hi);
    }

    #[test]
    fn test_register_replaces_old_position() {
        let (config, metrics) = (LayoutConfig::default(), TextMetrics::default());
        let mut ctx = context(&config, &metrics);
        ctx.register("A".into(), 10.0);
        ctx.register("A".into(), 50.0);
        assert_eq!(ctx.placed_count(), 1);
        // 10 is free again
        assert_eq!(ctx.claim("B".into(), 10.0), 10.0);
    }
}

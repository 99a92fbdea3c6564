//! Data structures passed between layout stages.

use std::collections::HashMap;
use std::sync::Arc;

use crate::diagram::NameKind;
use crate::measure::Footprint;
use crate::model::{Route, StopId};

/// A route that survived selection.
#[derive(Debug, Clone)]
pub struct SelectedRoute<'a> {
    pub route: &'a Route,
    /// Forward stop ids; index 0 is the selected stop. Each name appears once.
    pub forward: Vec<StopId>,
    /// Names of `forward`, index for index.
    pub names: Vec<Arc<str>>,
    pub trip_count: u32,
}

impl SelectedRoute<'_> {
    /// Names after the selected stop.
    pub fn onward(&self) -> &[Arc<str>] {
        &self.names[1..]
    }

    pub fn onward_ids(&self) -> &[StopId] {
        &self.forward[1..]
    }
}

/// Partition of the selected routes into similarity clusters.
#[derive(Debug, Clone, PartialEq)]
pub struct Clusters {
    /// Route index -> cluster index.
    pub cluster_of: Vec<usize>,
    /// Cluster index -> member route indices, ascending.
    pub members: Vec<Vec<usize>>,
}

impl Clusters {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Major-stop filtered onward sequence of one route.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedRoute {
    pub stops: Vec<StopId>,
    pub names: Vec<Arc<str>>,
}

impl DisplayedRoute {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| &**n == name)
    }
}

/// Sharing classification of every displayed name.
#[derive(Debug, Clone, Default)]
pub struct NameTags {
    /// Names in order of first appearance, scanning routes in display order.
    pub order: Vec<Arc<str>>,
    pub kinds: HashMap<Arc<str>, NameKind>,
    /// Name -> indices of the routes displaying it, ascending.
    pub carriers: HashMap<Arc<str>, Vec<usize>>,
}

impl NameTags {
    pub fn kind(&self, name: &str) -> Option<NameKind> {
        self.kinds.get(name).copied()
    }

    pub fn carriers(&self, name: &str) -> &[usize] {
        self.carriers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn names_of_kind(&self, kind: NameKind) -> impl Iterator<Item = &Arc<str>> + '_ {
        self.order
            .iter()
            .filter(move |n| self.kinds.get(*n) == Some(&kind))
    }
}

/// One label per name per contiguous run of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelEntry {
    pub text: Arc<str>,
    pub x: f64,
    pub y: f64,
    /// Anchor before collision resolution.
    pub natural_x: f64,
    pub row_start: usize,
    pub row_end: usize,
    pub footprint: Footprint,
}

impl LabelEntry {
    pub fn right(&self) -> f64 {
        self.x + self.footprint.width
    }

    pub fn top(&self) -> f64 {
        self.y - self.footprint.height
    }

    /// Rotated labels rise from their anchor, so the band is `[top, y]`.
    pub fn overlaps_vertically(&self, other: &LabelEntry) -> bool {
        self.top() < other.y && other.top() < self.y
    }
}

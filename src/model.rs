//! Stops, routes and their identifiers.
//!
//! Records enter the pipeline through the constructors here, which reject
//! structurally invalid data once so later stages never have to.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

macro_rules! impl_identifier {
    ($name:ident) => {
        /// Cheaply clonable identifier backed by `Arc<str>`.
        #[derive(Clone, Debug)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(s: impl AsRef<str>) -> Self {
                Self(s.as_ref().into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
            }
        }

        impl Eq for $name {}

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.0.cmp(&other.0)
            }
        }

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.0.hash(state);
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }
    };
}

impl_identifier!(StopId);
impl_identifier!(RouteId);

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ModelError {
    #[error("Empty identifier")]
    EmptyId,
    #[error("Stop {0} has an empty name")]
    EmptyName(StopId),
    #[error("Stop {id} has invalid coordinates ({lng}, {lat})")]
    InvalidCoordinates { id: StopId, lng: f64, lat: f64 },
    #[error("Route {0} has an empty stop sequence")]
    EmptySequence(RouteId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub id: StopId,
    pub name: Arc<str>,
    /// (lng, lat)
    pub coordinates: (f64, f64),
}

impl Stop {
    pub fn new(id: StopId, name: &str, lng: f64, lat: f64) -> Result<Self, ModelError> {
        if id.as_str().is_empty() {
            return Err(ModelError::EmptyId);
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(ModelError::EmptyName(id));
        }
        if !lng.is_finite() || !lat.is_finite() || lng.abs() > 180.0 || lat.abs() > 90.0 {
            return Err(ModelError::InvalidCoordinates { id, lng, lat });
        }
        Ok(Self {
            id,
            name: name.into(),
            coordinates: (lng, lat),
        })
    }
}

/// One stop pattern of a route, ending at `destination`.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub route_id: RouteId,
    pub route_name: Arc<str>,
    pub destination: StopId,
    pub stops: Vec<StopId>,
}

impl Route {
    /// Build a route whose destination is the last stop of `stops`.
    pub fn new(route_id: RouteId, route_name: &str, stops: Vec<StopId>) -> Result<Self, ModelError> {
        let destination = stops
            .last()
            .cloned()
            .ok_or_else(|| ModelError::EmptySequence(route_id.clone()))?;
        Self::with_destination(route_id, route_name, destination, stops)
    }

    pub fn with_destination(
        route_id: RouteId,
        route_name: &str,
        destination: StopId,
        stops: Vec<StopId>,
    ) -> Result<Self, ModelError> {
        if route_id.as_str().is_empty() {
            return Err(ModelError::EmptyId);
        }
        if stops.is_empty() {
            return Err(ModelError::EmptySequence(route_id));
        }
        if stops.iter().any(|s| s.as_str().is_empty()) || destination.as_str().is_empty() {
            return Err(ModelError::EmptyId);
        }
        let route_name = if route_name.trim().is_empty() {
            route_id.as_str()
        } else {
            route_name.trim()
        };
        Ok(Self {
            route_name: route_name.into(),
            route_id,
            destination,
            stops,
        })
    }

    pub fn passes(&self, stop: &StopId) -> bool {
        self.stops.contains(stop)
    }

    /// Suffix of the stop sequence starting at the first occurrence of
    /// `stop`, or the whole sequence when the route never calls there.
    pub fn forward_from(&self, stop: &StopId) -> &[StopId] {
        match self.stops.iter().position(|s| s == stop) {
            Some(idx) => &self.stops[idx..],
            None => &self.stops,
        }
    }
}

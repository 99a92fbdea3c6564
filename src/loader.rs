//! Reading a preprocessed city bundle into a [`StaticCatalog`].
//!
//! A bundle directory holds `stops.min.json`, `services.min.json`, an
//! optional `ranking.min.json` and an optional `schedule/` directory with
//! one file per stop.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::StaticCatalog;
use crate::model::{ModelError, Route, RouteId, Stop, StopId};

pub const STOPS_FILE: &str = "stops.min.json";
pub const SERVICES_FILE: &str = "services.min.json";
pub const RANKING_FILE: &str = "ranking.min.json";
pub const SCHEDULE_DIR: &str = "schedule";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Identifiers arrive as JSON strings or bare integers.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(serde_json::Number),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

/// `[lng, lat, name, extra]`
#[derive(Debug, Deserialize)]
struct StopRecord(f64, f64, String, #[serde(default)] String);

#[derive(Debug, Deserialize)]
struct ServiceRecord {
    #[serde(default)]
    name: String,
    /// Destination stop id -> stop sequence variants ending there, in bundle
    /// order (busiest destination first).
    #[serde(flatten)]
    destinations: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    services: Vec<ScheduleService>,
}

/// One route direction calling at a stop, from `schedule/<stop>.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleService {
    #[serde(rename = "no", deserialize_with = "raw_string")]
    pub route_id: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    /// Arrival times, `HH:MM`.
    #[serde(default)]
    pub trips: Vec<String>,
    #[serde(default)]
    pub trip_count: Option<u32>,
}

impl ScheduleService {
    pub fn trip_count(&self) -> u32 {
        self.trip_count
            .unwrap_or_else(|| u32::try_from(self.trips.len()).unwrap_or(u32::MAX))
    }
}

fn raw_string<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(RawId::into_string)
}

fn parse<T: serde::de::DeserializeOwned>(json: &str, origin: &Path) -> Result<T, LoadError> {
    serde_json::from_str(json).map_err(|source| LoadError::Json {
        path: origin.to_path_buf(),
        source,
    })
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_stops(json: &str, origin: &Path) -> Result<Vec<Stop>, LoadError> {
    let records: BTreeMap<String, StopRecord> = parse(json, origin)?;
    records
        .into_iter()
        .map(|(id, StopRecord(lng, lat, name, _))| {
            Stop::new(id.into(), &name, lng, lat).map_err(LoadError::from)
        })
        .collect()
}

/// Every `(route, destination, variant)` becomes its own [`Route`].
pub fn parse_services(json: &str, origin: &Path) -> Result<Vec<Route>, LoadError> {
    let records: BTreeMap<String, ServiceRecord> = parse(json, origin)?;
    let mut routes = Vec::new();
    for (route_id, record) in records {
        let route_id = RouteId::new(route_id);
        for (destination, variants) in record.destinations {
            let variants: Vec<Vec<RawId>> =
                serde_json::from_value(variants).map_err(|source| LoadError::Json {
                    path: origin.to_path_buf(),
                    source,
                })?;
            for variant in variants {
                if variant.is_empty() {
                    tracing::debug!(route = %route_id, %destination, "skipping empty variant");
                    continue;
                }
                let stops: Vec<StopId> = variant
                    .into_iter()
                    .map(|id| StopId::new(id.into_string()))
                    .collect();
                routes.push(Route::with_destination(
                    route_id.clone(),
                    &record.name,
                    StopId::new(&destination),
                    stops,
                )?);
            }
        }
    }
    Ok(routes)
}

pub fn parse_ranking(json: &str, origin: &Path) -> Result<HashMap<StopId, f64>, LoadError> {
    let records: HashMap<String, f64> = parse(json, origin)?;
    Ok(records
        .into_iter()
        .map(|(id, score)| (StopId::new(id), score.max(0.0)))
        .collect())
}

pub fn parse_schedule(json: &str, origin: &Path) -> Result<Vec<ScheduleService>, LoadError> {
    let file: ScheduleFile = parse(json, origin)?;
    Ok(file.services)
}

/// Build a catalog from the bundle's JSON documents.
pub fn from_json_strs(
    stops: &str,
    services: &str,
    ranking: Option<&str>,
) -> Result<StaticCatalog, LoadError> {
    let stops = parse_stops(stops, Path::new(STOPS_FILE))?;
    let routes = parse_services(services, Path::new(SERVICES_FILE))?;
    warn_unknown_stops(&stops, &routes);

    let mut catalog = StaticCatalog::new(stops, routes);
    if let Some(ranking) = ranking {
        catalog.set_ranking(parse_ranking(ranking, Path::new(RANKING_FILE))?);
    }
    tracing::debug!(
        stops = catalog.stop_count(),
        routes = catalog.routes().len(),
        ranked = catalog.has_ranking(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Load `stops.min.json`, `services.min.json` and, when present,
/// `ranking.min.json` from `dir`.
pub fn from_dir(dir: &Path) -> Result<StaticCatalog, LoadError> {
    let stops = read(&dir.join(STOPS_FILE))?;
    let services = read(&dir.join(SERVICES_FILE))?;
    let ranking_path = dir.join(RANKING_FILE);
    let ranking = if ranking_path.is_file() {
        Some(read(&ranking_path)?)
    } else {
        None
    };

    let mut catalog = from_json_strs(&stops, &services, ranking.as_deref())
        .map_err(|e| relocate(e, dir))?;
    if catalog.has_ranking() {
        return Ok(catalog);
    }
    tracing::debug!("no ranking file, deriving scores from stop sequences");
    let scores = crate::ranking::rank_stops(catalog.routes());
    catalog.set_ranking(scores);
    Ok(catalog)
}

/// Point JSON errors at the real file instead of its bare name.
fn relocate(err: LoadError, dir: &Path) -> LoadError {
    match err {
        LoadError::Json { path, source } => LoadError::Json {
            path: dir.join(path),
            source,
        },
        other => other,
    }
}

/// Read `schedule/<stop>.json` and record its trip counts. A missing file
/// is not an error; an unreadable or malformed one is logged and skipped.
/// Returns the number of services recorded.
pub fn load_schedule(catalog: &mut StaticCatalog, dir: &Path, stop: &StopId) -> usize {
    let path = dir.join(SCHEDULE_DIR).join(format!("{stop}.json"));
    let json = match fs::read_to_string(&path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return 0,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "schedule unreadable");
            return 0;
        }
    };
    match parse_schedule(&json, &path) {
        Ok(services) => apply_schedule(catalog, &services),
        Err(e) => {
            tracing::warn!(error = %e, "schedule skipped");
            0
        }
    }
}

/// Record trip counts keyed by route and destination.
pub fn apply_schedule(catalog: &mut StaticCatalog, services: &[ScheduleService]) -> usize {
    let mut applied = 0;
    for service in services {
        if service.route_id.is_empty() || service.destination.is_empty() {
            continue;
        }
        catalog.set_trip_count(
            RouteId::new(&service.route_id),
            StopId::new(&service.destination),
            service.trip_count(),
        );
        applied += 1;
    }
    applied
}

fn warn_unknown_stops(stops: &[Stop], routes: &[Route]) {
    let known: BTreeSet<&StopId> = stops.iter().map(|s| &s.id).collect();
    let mut reported: BTreeSet<&StopId> = BTreeSet::new();
    for route in routes {
        for id in &route.stops {
            if !known.contains(id) && reported.insert(id) {
                tracing::warn!(route = %route.route_id, stop = %id, "route references unknown stop");
            }
        }
    }
}

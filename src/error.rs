//! Error taxonomy for loading, querying and exporting wind zones.
//!
//! A point that falls outside every zone is not an error; see
//! [`crate::geography::locate::LocateOutcome::NotFound`].

use std::path::PathBuf;

/// Malformed or incomplete dataset. Fatal: no lookups are possible without a
/// valid registry.
#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    GeoJson(String),
    #[error("invalid shapefile: {0}")]
    Shapefile(String),
    #[error("unsupported dataset extension for {}", .0.display())]
    UnsupportedSource(PathBuf),
    #[error("dataset contains no zone features")]
    Empty,
    #[error("feature {index} is missing property '{property}'")]
    MissingProperty { index: usize, property: &'static str },
    #[error("feature {index} has an empty zone identifier")]
    EmptyZoneId { index: usize },
    #[error("feature {index} ({zone_id}) has invalid geometry: {reason}")]
    InvalidGeometry {
        index: usize,
        zone_id: String,
        reason: String,
    },
    #[error("feature {index} references zone '{zone_id}' which has no speed/color mapping")]
    UnmappedZone { index: usize, zone_id: String },
    #[error("invalid zone table: {0}")]
    ZoneTable(String),
    #[error("dataset load task failed: {0}")]
    LoadTask(String),
}

/// An unknown zone identifier was referenced.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("unknown zone '{0}'")]
    UnknownZone(String),
}

/// Malformed coordinate input.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("expected \"lat,lon\" with exactly two components, found {0}")]
    ComponentCount(usize),
    #[error("'{0}' is not a number")]
    NotNumeric(String),
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

/// Place search failed.
#[derive(thiserror::Error, Debug)]
pub enum GeocodeError {
    #[error("no place found for '{0}'")]
    NoResults(String),
    #[error("geocoding request timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("geocoding request failed: {0}")]
    Network(String),
    #[error("geocoder returned status {0}")]
    Status(u16),
    #[error("geocoder returned an unusable response: {0}")]
    InvalidResponse(String),
}

/// Report export failed.
#[derive(thiserror::Error, Debug)]
pub enum ExportError {
    #[error("no location selected; look up a location first")]
    NoResult,
    #[error("failed to write report to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure of a single session interaction.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("zone dataset is still loading")]
    NotReady,
    #[error("zone dataset failed to load")]
    Failed,
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

//! Error catalog for dataset loading and lookup.
//!
//! Only configuration and initialization faults are hard errors. Data-quality
//! conditions observed at query time (holes, overlapping polygons, points
//! outside coverage) are reported through `LookupStatus`, never as errors.

use std::path::PathBuf;

use thiserror::Error;

/// Malformed or missing manifest content. Fatal at load time: no partial
/// manifest is ever produced.
#[derive(Debug, Error)]
#[error("invalid manifest at {}: {reason}", path.display())]
pub struct ManifestError {
    pub path: PathBuf,
    pub reason: String,
}

impl ManifestError {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// A manifest policy name outside the recognized catalog. Fatal at load time.
#[derive(Debug, Error)]
#[error("unknown supplementation policy {name:?}")]
pub struct UnknownPolicyError {
    pub name: String,
}

/// Geometry or I/O failure while building a snapshot. Fatal for that load
/// attempt; a previously active snapshot stays in place.
#[derive(Debug, Error)]
pub enum DatasetLoadError {
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed geometry file {}: {reason}", path.display())]
    Geometry { path: PathBuf, reason: String },
}

/// Any fatal fault while building a `DatasetSnapshot`.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    UnknownPolicy(#[from] UnknownPolicyError),

    #[error(transparent)]
    Dataset(#[from] DatasetLoadError),
}

/// Coordinates outside `lat ∈ [-90, 90]` / `lon ∈ [-180, 180]`. Rejected
/// before any spatial work is performed.
#[derive(Debug, Error)]
#[error("coordinates out of range: lat={lat}, lon={lon}")]
pub struct InvalidCoordinateError {
    pub lat: f64,
    pub lon: f64,
}

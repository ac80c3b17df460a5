//! Geometry source loading and snapshot assembly.
//!
//! A `DatasetSnapshot` is built once from a checksum-verified, fully
//! unpacked dataset directory (the transport collaborator has already done
//! that work) and is never mutated afterwards. A version upgrade builds an
//! entirely new snapshot.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use tracing::info;

use crate::error::{DatasetLoadError, LoadError};
use crate::index::SpatialIndex;
use crate::manifest::{validated_source_path, DatasetManifest, LevelSpec, MANIFEST_FILE};
use crate::models::AdminFeature;

/// One immutable, fully loaded in-memory dataset version.
#[derive(Debug)]
pub struct DatasetSnapshot {
    pub manifest: DatasetManifest,
    pub index: SpatialIndex,
}

impl DatasetSnapshot {
    /// Load a snapshot from `dataset_dir`. All-or-nothing: any manifest or
    /// geometry fault fails the whole load and no snapshot is produced.
    pub fn load(dataset_dir: &Path) -> Result<Arc<Self>, LoadError> {
        let manifest = DatasetManifest::parse(dataset_dir)?;
        info!(
            "Loading dataset {} v{} ({} levels)...",
            manifest.dataset_id,
            manifest.version,
            manifest.levels.len()
        );

        let mut sets = Vec::with_capacity(manifest.levels.len());
        for spec in &manifest.levels {
            let features = load_level_features(dataset_dir, spec)?;
            sets.push((spec.level, features));
        }
        let index = SpatialIndex::build(sets);
        info!(
            "Dataset {} v{} loaded: {} features indexed",
            manifest.dataset_id,
            manifest.version,
            index.len()
        );

        Ok(Arc::new(Self { manifest, index }))
    }
}

/// Geometry file entry: multipolygon as polygons -> rings -> [lon, lat],
/// first ring of each polygon the exterior, the rest holes.
#[derive(Debug, Deserialize)]
struct RawFeature {
    id: String,
    names: HashMap<String, String>,
    #[serde(default)]
    parent_id: Option<String>,
    geometry: Vec<Vec<Vec<[f64; 2]>>>,
}

fn load_level_features(
    dataset_dir: &Path,
    spec: &LevelSpec,
) -> Result<Vec<AdminFeature>, DatasetLoadError> {
    let manifest_path = dataset_dir.join(MANIFEST_FILE);
    let path = validated_source_path(dataset_dir, &manifest_path, &spec.file)
        .map_err(|e| DatasetLoadError::Geometry {
            path: dataset_dir.join(&spec.file),
            reason: e.reason,
        })?;

    let content = fs::read_to_string(&path).map_err(|source| DatasetLoadError::Io {
        path: path.clone(),
        source,
    })?;
    let raw: Vec<RawFeature> =
        serde_json::from_str(&content).map_err(|e| DatasetLoadError::Geometry {
            path: path.clone(),
            reason: format!("malformed JSON: {e}"),
        })?;

    let mut seen = hashbrown::HashSet::new();
    let mut features = Vec::with_capacity(raw.len());
    for entry in raw {
        if entry.id.trim().is_empty() {
            return Err(DatasetLoadError::Geometry {
                path: path.clone(),
                reason: "feature with empty id".to_string(),
            });
        }
        if !seen.insert(entry.id.clone()) {
            return Err(DatasetLoadError::Geometry {
                path: path.clone(),
                reason: format!("duplicate feature id {:?}", entry.id),
            });
        }
        if !entry.names.contains_key("default") {
            return Err(DatasetLoadError::Geometry {
                path: path.clone(),
                reason: format!("feature {:?} has no default name", entry.id),
            });
        }
        let geometry = build_multipolygon(&entry.geometry).map_err(|reason| {
            DatasetLoadError::Geometry {
                path: path.clone(),
                reason: format!("feature {:?}: {reason}", entry.id),
            }
        })?;
        features.push(AdminFeature::new(
            entry.id,
            spec.level,
            entry.names,
            entry.parent_id,
            geometry,
        ));
    }
    info!(
        "  level {} ({}): {} features from {}",
        spec.level,
        spec.label,
        features.len(),
        spec.file
    );
    Ok(features)
}

fn build_multipolygon(rings: &[Vec<Vec<[f64; 2]>>]) -> Result<MultiPolygon<f64>, String> {
    if rings.is_empty() {
        return Err("empty geometry".to_string());
    }
    let mut polygons = Vec::with_capacity(rings.len());
    for polygon in rings {
        let mut iter = polygon.iter();
        let exterior = iter.next().ok_or("polygon with no rings")?;
        let exterior = build_ring(exterior)?;
        let interiors = iter.map(|r| build_ring(r)).collect::<Result<Vec<_>, _>>()?;
        polygons.push(Polygon::new(exterior, interiors));
    }
    Ok(MultiPolygon::new(polygons))
}

fn build_ring(coords: &[[f64; 2]]) -> Result<LineString<f64>, String> {
    if coords.len() < 3 {
        return Err(format!("ring with {} points", coords.len()));
    }
    Ok(LineString::from(
        coords
            .iter()
            .map(|c| Coord { x: c[0], y: c[1] })
            .collect::<Vec<_>>(),
    ))
}

//! Lookup engine facade: owns one active snapshot, orchestrates
//! composition and supplementation, and exposes the public lookup call.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use geo::Point;
use tracing::info;

use crate::compose::{compose, DraftSlot};
use crate::dataset::DatasetSnapshot;
use crate::error::{InvalidCoordinateError, LoadError};
use crate::models::{HierarchyNode, HierarchyResult, LookupStatus, RegionContext};
use crate::policy::apply_chain;

/// Run one lookup against a pinned snapshot.
///
/// Pure and read-only: no locking, no I/O. Callers holding the same
/// `Arc<DatasetSnapshot>` get byte-identical results for the same point.
pub fn lookup_at(
    snapshot: &DatasetSnapshot,
    lat: f64,
    lon: f64,
) -> Result<HierarchyResult, InvalidCoordinateError> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(InvalidCoordinateError { lat, lon });
    }
    let point = Point::new(lon, lat);

    let mut draft = compose(snapshot, point);
    apply_chain(&mut draft, snapshot, point);

    let mut nodes = Vec::with_capacity(draft.resolved_count());
    for slot in &draft.slots {
        if let DraftSlot::Resolved { feature, name, source } = slot {
            nodes.push(HierarchyNode {
                level: feature.level,
                name: name.clone(),
                id: feature.id.clone(),
                rank: nodes.len(),
                source: *source,
            });
        }
    }

    let lookup_status = if nodes.is_empty() {
        LookupStatus::NotFound
    } else if draft.hole_count() > 0 {
        LookupStatus::Partial
    } else {
        LookupStatus::Ok
    };

    let summary_text = summary_text(&nodes, snapshot);

    Ok(HierarchyResult {
        nodes,
        lookup_status,
        region: RegionContext {
            iso2: snapshot.manifest.region_iso2.clone(),
            name: snapshot.manifest.region_name.clone(),
        },
        version: snapshot.manifest.version.clone(),
        summary_text,
    })
}

fn summary_text(nodes: &[HierarchyNode], snapshot: &DatasetSnapshot) -> String {
    let locale = &snapshot.manifest.locale;
    let mut names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
    if locale.fine_to_coarse {
        names.reverse();
    }
    names.join(&locale.separator)
}

/// One engine instance per region: owns exactly one active snapshot.
/// Multi-region dispatch is an external routing concern.
pub struct LookupEngine {
    active: RwLock<Arc<DatasetSnapshot>>,
}

impl LookupEngine {
    pub fn new(snapshot: Arc<DatasetSnapshot>) -> Self {
        Self {
            active: RwLock::new(snapshot),
        }
    }

    /// Build the initial snapshot from an already unpacked, checksum-verified
    /// dataset directory.
    pub fn load(dataset_dir: &Path) -> Result<Self, LoadError> {
        Ok(Self::new(DatasetSnapshot::load(dataset_dir)?))
    }

    /// Handle to the currently active snapshot generation. Holding the Arc
    /// pins that generation across calls; later swaps do not affect it.
    pub fn snapshot(&self) -> Arc<DatasetSnapshot> {
        Arc::clone(&self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Resolve the admin hierarchy containing (`lat`, `lon`) against the
    /// currently active snapshot.
    pub fn lookup(&self, lat: f64, lon: f64) -> Result<HierarchyResult, InvalidCoordinateError> {
        let snapshot = self.snapshot();
        lookup_at(&snapshot, lat, lon)
    }

    /// Single-writer version upgrade: build a fresh snapshot off to the
    /// side, then atomically replace the active reference. In-flight
    /// lookups keep reading the previous snapshot until the swap; a failed
    /// load leaves it active.
    pub fn reload(&self, dataset_dir: &Path) -> Result<(), LoadError> {
        let next = DatasetSnapshot::load(dataset_dir)?;
        let version = next.manifest.version.clone();
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = next;
        info!("Snapshot swapped to version {}", version);
        Ok(())
    }
}

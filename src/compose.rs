//! Hierarchy composition: ordered multi-level containment resolution.

use std::sync::Arc;

use geo::Point;
use tracing::debug;

use crate::dataset::DatasetSnapshot;
use crate::models::{AdminFeature, NodeSource};

/// One position in a draft hierarchy, aligned with the manifest's levels.
#[derive(Clone)]
pub enum DraftSlot {
    Resolved {
        feature: Arc<AdminFeature>,
        /// Display name; starts as the feature's default name, policies may
        /// normalize it
        name: String,
        source: NodeSource,
    },
    Hole {
        level: u8,
    },
}

impl DraftSlot {
    pub fn level(&self) -> u8 {
        match self {
            DraftSlot::Resolved { feature, .. } => feature.level,
            DraftSlot::Hole { level } => *level,
        }
    }

    pub fn is_hole(&self) -> bool {
        matches!(self, DraftSlot::Hole { .. })
    }
}

/// Draft produced by composition: one slot per manifest level, in manifest
/// order, holes included.
#[derive(Clone)]
pub struct DraftHierarchy {
    pub slots: Vec<DraftSlot>,
}

impl DraftHierarchy {
    pub fn hole_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_hole()).count()
    }

    pub fn resolved_count(&self) -> usize {
        self.slots.len() - self.hole_count()
    }
}

/// Resolve which feature contains the point at every manifest level,
/// coarsest first.
///
/// Once a level resolves, finer levels prefer candidates whose parent-id
/// hint names the previously resolved node, falling back to the best
/// spatial match when no hint matches. A level with no containing
/// candidate becomes a hole; resolution of finer levels continues.
/// Deterministic: identical point and snapshot always yield an identical
/// draft, hole positions included.
pub fn compose(snapshot: &DatasetSnapshot, point: Point<f64>) -> DraftHierarchy {
    let mut slots = Vec::with_capacity(snapshot.manifest.levels.len());
    let mut prev: Option<Arc<AdminFeature>> = None;

    for spec in &snapshot.manifest.levels {
        let candidates = snapshot.index.query(spec.level, point);
        let chosen = match &prev {
            Some(parent) => candidates
                .iter()
                .find(|c| c.parent_id.as_deref() == Some(parent.id.as_str()))
                .or_else(|| candidates.first())
                .cloned(),
            None => candidates.first().cloned(),
        };
        match chosen {
            Some(feature) => {
                let name = feature.default_name().cloned().unwrap_or_default();
                prev = Some(Arc::clone(&feature));
                slots.push(DraftSlot::Resolved {
                    feature,
                    name,
                    source: NodeSource::Polygon,
                });
            }
            None => {
                debug!("No containing feature at level {}", spec.level);
                slots.push(DraftSlot::Hole { level: spec.level });
            }
        }
    }

    DraftHierarchy { slots }
}

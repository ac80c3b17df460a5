//! Per-level spatial index over administrative boundary features.
//!
//! Each manifest level gets its own R-tree keyed on feature bounding boxes.
//! A query narrows candidates by envelope intersection, applies an exact
//! boundary-inclusive containment test, and orders survivors by the
//! deterministic tie-break (ascending area, then ascending id).

use std::sync::Arc;

use geo::{Intersects, Point};
use hashbrown::HashMap;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::AdminFeature;

/// Wrapper for R-tree indexing of admin features
#[derive(Debug, Clone)]
struct IndexedFeature {
    feature: Arc<AdminFeature>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedFeature {
    fn new(feature: Arc<AdminFeature>) -> Option<Self> {
        let (min_x, min_y, max_x, max_y) = feature.bbox()?;
        Some(Self {
            feature,
            envelope: AABB::from_corners([min_x, min_y], [max_x, max_y]),
        })
    }
}

#[derive(Debug)]
struct LevelIndex {
    level: u8,
    tree: RTree<IndexedFeature>,
    features: Vec<Arc<AdminFeature>>,
    by_id: HashMap<String, Arc<AdminFeature>>,
}

/// Point-containment index over every level of one dataset version.
/// Built once at load time, read-only thereafter.
#[derive(Debug)]
pub struct SpatialIndex {
    levels: Vec<LevelIndex>,
}

impl SpatialIndex {
    /// Build the per-level trees. `sets` arrives in manifest level order.
    pub fn build(sets: Vec<(u8, Vec<AdminFeature>)>) -> Self {
        let mut levels = Vec::with_capacity(sets.len());
        for (level, features) in sets {
            let features: Vec<Arc<AdminFeature>> = features.into_iter().map(Arc::new).collect();
            let by_id = features
                .iter()
                .map(|f| (f.id.clone(), Arc::clone(f)))
                .collect();
            let indexed: Vec<IndexedFeature> = features
                .iter()
                .filter_map(|f| IndexedFeature::new(Arc::clone(f)))
                .collect();
            let tree = RTree::bulk_load(indexed);
            info!(
                "Indexed level {}: {} features ({} with envelopes)",
                level,
                features.len(),
                tree.size()
            );
            levels.push(LevelIndex {
                level,
                tree,
                features,
                by_id,
            });
        }
        Self { levels }
    }

    fn level_index(&self, level: u8) -> Option<&LevelIndex> {
        self.levels.iter().find(|l| l.level == level)
    }

    /// All features containing the point at one level, most specific first.
    ///
    /// Overlapping same-level polygons are a data-quality condition, not an
    /// error: the ordering (smaller area, then lexicographic id) makes the
    /// choice reproducible across runs and implementations.
    pub fn query(&self, level: u8, point: Point<f64>) -> Vec<Arc<AdminFeature>> {
        let Some(idx) = self.level_index(level) else {
            return Vec::new();
        };
        let envelope = AABB::from_point([point.x(), point.y()]);
        let mut hits: Vec<Arc<AdminFeature>> = idx
            .tree
            .locate_in_envelope_intersecting(&envelope)
            // Intersects is boundary-inclusive for a point against a polygon
            .filter(|ix| ix.feature.geometry.intersects(&point))
            .map(|ix| Arc::clone(&ix.feature))
            .collect();
        hits.sort_by(|a, b| a.area.total_cmp(&b.area).then_with(|| a.id.cmp(&b.id)));
        hits
    }

    /// Feature with the given id at one level.
    pub fn feature_by_id(&self, level: u8, id: &str) -> Option<&Arc<AdminFeature>> {
        self.level_index(level)?.by_id.get(id)
    }

    /// All features at one level (load order), for policy candidate scans.
    pub fn features_at(&self, level: u8) -> &[Arc<AdminFeature>] {
        self.level_index(level)
            .map(|l| l.features.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of indexed features
    pub fn len(&self) -> usize {
        self.levels.iter().map(|l| l.tree.size()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

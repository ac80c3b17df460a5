//! Supplementation pipeline: the manifest's declarative post-processing
//! chain over a draft hierarchy.
//!
//! Each policy is a pure transformation: no I/O, no hidden state. A policy
//! may only fill hole slots or normalize display fields; it never reorders
//! or drops an already-resolved node. The full chain is idempotent on a
//! complete hierarchy. A policy that cannot satisfy its contract leaves the
//! hole in place; the final status degrades to partial instead of failing
//! the call.

use std::sync::Arc;

use geo::{Intersects, Point};
use tracing::debug;

use crate::compose::{DraftHierarchy, DraftSlot};
use crate::dataset::DatasetSnapshot;
use crate::models::{AdminFeature, NodeSource};

/// Closed catalog of recognized supplementation policies.
///
/// Adding a policy kind is a localized, additive change: a new variant, a
/// name mapping, and an arm in `apply_chain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Fill a hole from a resolved child's parent-id hint
    ParentLinkRepair,
    /// Fill a hole with the nearest-centroid feature inside the resolved
    /// parent's boundary
    CentroidGapFill,
    /// Rewrite display names to the manifest locale's name key
    LocalizeNames,
}

impl PolicyKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "parent_link_repair" => Some(PolicyKind::ParentLinkRepair),
            "centroid_gap_fill" => Some(PolicyKind::CentroidGapFill),
            "localize_names" => Some(PolicyKind::LocalizeNames),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::ParentLinkRepair => "parent_link_repair",
            PolicyKind::CentroidGapFill => "centroid_gap_fill",
            PolicyKind::LocalizeNames => "localize_names",
        }
    }
}

/// Run the manifest's policy chain in declared order.
pub fn apply_chain(draft: &mut DraftHierarchy, snapshot: &DatasetSnapshot, point: Point<f64>) {
    for kind in &snapshot.manifest.policies {
        match kind {
            PolicyKind::ParentLinkRepair => parent_link_repair(draft, snapshot),
            PolicyKind::CentroidGapFill => centroid_gap_fill(draft, snapshot, point),
            PolicyKind::LocalizeNames => localize_names(draft, snapshot),
        }
    }
}

/// For each hole at level P, look for a resolved finer node that declares P
/// as its expected parent level and carries a parent-id hint naming a known
/// level-P feature. First matching child in level order wins.
fn parent_link_repair(draft: &mut DraftHierarchy, snapshot: &DatasetSnapshot) {
    for i in 0..draft.slots.len() {
        let DraftSlot::Hole { level } = draft.slots[i] else {
            continue;
        };
        let Some(repaired) = find_parent_from_children(draft, snapshot, level) else {
            continue;
        };
        debug!(
            "parent_link_repair filled level {} with {}",
            level, repaired.id
        );
        let name = repaired.default_name().cloned().unwrap_or_default();
        draft.slots[i] = DraftSlot::Resolved {
            feature: repaired,
            name,
            source: NodeSource::ParentLink,
        };
    }
}

fn find_parent_from_children(
    draft: &DraftHierarchy,
    snapshot: &DatasetSnapshot,
    parent_level: u8,
) -> Option<Arc<AdminFeature>> {
    for slot in &draft.slots {
        let DraftSlot::Resolved { feature, .. } = slot else {
            continue;
        };
        let Some(spec) = snapshot.manifest.level_spec(feature.level) else {
            continue;
        };
        if spec.parent_level != Some(parent_level) {
            continue;
        }
        let Some(hint) = feature.parent_id.as_deref() else {
            continue;
        };
        if let Some(parent) = snapshot.index.feature_by_id(parent_level, hint) {
            return Some(Arc::clone(parent));
        }
    }
    None
}

/// For each hole at level L with a resolved coarser neighbor, pick the
/// level-L feature whose centroid lies inside that parent's boundary and is
/// nearest the query point. Ties break on ascending feature id so the fill
/// is reproducible.
fn centroid_gap_fill(draft: &mut DraftHierarchy, snapshot: &DatasetSnapshot, point: Point<f64>) {
    for i in 0..draft.slots.len() {
        let DraftSlot::Hole { level } = draft.slots[i] else {
            continue;
        };
        // Nearest resolved coarser level acts as the containing parent.
        let parent = draft.slots[..i].iter().rev().find_map(|s| match s {
            DraftSlot::Resolved { feature, .. } => Some(Arc::clone(feature)),
            DraftSlot::Hole { .. } => None,
        });
        let Some(parent) = parent else {
            continue;
        };

        let mut best: Option<(f64, &Arc<AdminFeature>)> = None;
        for candidate in snapshot.index.features_at(level) {
            let Some(centroid) = candidate.centroid else {
                continue;
            };
            if !parent.geometry.intersects(&centroid) {
                continue;
            }
            let dx = centroid.x() - point.x();
            let dy = centroid.y() - point.y();
            let dist = dx * dx + dy * dy;
            let better = match best {
                None => true,
                Some((best_dist, best_feat)) => {
                    dist < best_dist || (dist == best_dist && candidate.id < best_feat.id)
                }
            };
            if better {
                best = Some((dist, candidate));
            }
        }

        if let Some((_, chosen)) = best {
            debug!("centroid_gap_fill filled level {} with {}", level, chosen.id);
            let name = chosen.default_name().cloned().unwrap_or_default();
            draft.slots[i] = DraftSlot::Resolved {
                feature: Arc::clone(chosen),
                name,
                source: NodeSource::Centroid,
            };
        }
    }
}

/// Rewrite each resolved node's display name to the locale's name key,
/// falling back to the default entry, trimming surrounding whitespace.
fn localize_names(draft: &mut DraftHierarchy, snapshot: &DatasetSnapshot) {
    let key = snapshot.manifest.locale.name_key.as_str();
    for slot in &mut draft.slots {
        if let DraftSlot::Resolved { feature, name, .. } = slot {
            if let Some(localized) = feature.name_for(key) {
                *name = localized.trim().to_string();
            }
        }
    }
}

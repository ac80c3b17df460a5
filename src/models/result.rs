//! Lookup result types handed to the serving layer.
//!
//! The engine is transport-agnostic: these types derive `Serialize` so a
//! downstream collaborator can shape them into its JSON envelope, but the
//! engine itself never produces JSON.

use serde::Serialize;

/// Outcome classification for one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// Every manifest level resolved
    Ok,
    /// Holes remained after supplementation
    Partial,
    /// No level resolved at all (point outside dataset coverage)
    NotFound,
}

impl LookupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupStatus::Ok => "ok",
            LookupStatus::Partial => "partial",
            LookupStatus::NotFound => "not_found",
        }
    }
}

/// How a node entered the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSource {
    /// Direct point-in-polygon hit
    Polygon,
    /// Filled from a resolved child's parent-id hint
    ParentLink,
    /// Filled by nearest-centroid selection within the resolved parent
    Centroid,
}

impl NodeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeSource::Polygon => "polygon",
            NodeSource::ParentLink => "parent_link",
            NodeSource::Centroid => "centroid",
        }
    }
}

/// One resolved entry in the final ordered hierarchy.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyNode {
    pub level: u8,
    pub name: String,
    #[serde(rename = "osm_id")]
    pub id: String,
    /// Position in final ordered output, 0 = coarsest
    pub rank: usize,
    pub source: NodeSource,
}

/// Region identity carried from the manifest into every result.
#[derive(Debug, Clone, Serialize)]
pub struct RegionContext {
    pub iso2: String,
    pub name: String,
}

/// Ordered hierarchy for one query point.
///
/// Nodes are strictly increasing by level and by rank; no level appears
/// twice.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyResult {
    pub nodes: Vec<HierarchyNode>,
    pub lookup_status: LookupStatus,
    pub region: RegionContext,
    /// Dataset version the answering snapshot was built from
    pub version: String,
    /// Locale-ordered concatenation of resolved node names
    pub summary_text: String,
}

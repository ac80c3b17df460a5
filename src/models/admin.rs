//! Administrative boundary features loaded from a dataset.

use std::collections::HashMap;

use geo::{Area, BoundingRect, Centroid, MultiPolygon, Point};

/// A single administrative boundary polygon with metadata.
///
/// Immutable once loaded. Area and centroid are computed at construction so
/// the tie-break and gap-fill paths never recompute geometry per query.
#[derive(Debug, Clone)]
pub struct AdminFeature {
    /// Stable feature identifier (e.g. `tw_r1293250`)
    pub id: String,

    /// Admin level this feature belongs to (from the manifest's level spec)
    pub level: u8,

    /// Multilingual names: {"default": "...", "en": "...", ...}
    pub names: HashMap<String, String>,

    /// Identifier of the feature's declared parent, if the source knows it
    pub parent_id: Option<String>,

    /// Boundary geometry
    pub geometry: MultiPolygon<f64>,

    /// Unsigned planar area, used for the smaller-is-more-specific tie-break
    pub area: f64,

    /// Geometric centroid, used by centroid gap-fill
    pub centroid: Option<Point<f64>>,
}

impl AdminFeature {
    pub fn new(
        id: String,
        level: u8,
        names: HashMap<String, String>,
        parent_id: Option<String>,
        geometry: MultiPolygon<f64>,
    ) -> Self {
        let area = geometry.unsigned_area();
        let centroid = geometry.centroid();
        Self {
            id,
            level,
            names,
            parent_id,
            geometry,
            area,
            centroid,
        }
    }

    /// Get the bounding box of this feature
    pub fn bbox(&self) -> Option<(f64, f64, f64, f64)> {
        self.geometry
            .bounding_rect()
            .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
    }

    /// Name under the given key, falling back to the default entry.
    pub fn name_for(&self, key: &str) -> Option<&String> {
        self.names.get(key).or_else(|| self.names.get("default"))
    }

    /// Default display name
    pub fn default_name(&self) -> Option<&String> {
        self.names.get("default")
    }
}

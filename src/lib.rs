//! Alder - deterministic, dataset-driven administrative hierarchy lookup.
//!
//! Given a geographic point and a pre-built, versioned regional dataset,
//! resolves the nested chain of administrative units containing that point
//! (country, city, district, ...), applying the dataset's declared
//! supplementation policies to fill or repair gaps.
//!
//! The engine only interprets a dataset it is handed: transport, checksum
//! verification, archive extraction, and HTTP serving belong to external
//! collaborators, and no network or disk I/O happens inside a lookup call.

pub mod compose;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod index;
pub mod manifest;
pub mod models;
pub mod policy;

pub use dataset::DatasetSnapshot;
pub use engine::{lookup_at, LookupEngine};
pub use error::{
    DatasetLoadError, InvalidCoordinateError, LoadError, ManifestError, UnknownPolicyError,
};
pub use manifest::{DatasetManifest, LevelSpec, LocaleConfig};
pub use models::{AdminFeature, HierarchyNode, HierarchyResult, LookupStatus, NodeSource};
pub use policy::PolicyKind;

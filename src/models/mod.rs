//! Core data models for the lookup engine.

pub mod admin;
pub mod result;

pub use admin::AdminFeature;
pub use result::{HierarchyNode, HierarchyResult, LookupStatus, NodeSource, RegionContext};

//! Dataset manifest parsing and validation.
//!
//! A dataset directory carries a `manifest.json` declaring the hierarchy
//! levels, the supplementation policy chain, locale configuration, and
//! integrity metadata. Validation is all-or-nothing: a manifest that fails
//! any check never produces a partial value.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LoadError, ManifestError, UnknownPolicyError};
use crate::policy::PolicyKind;

pub const MANIFEST_FILE: &str = "manifest.json";

/// One declared hierarchy level and its geometry source.
#[derive(Debug, Clone, Deserialize)]
pub struct LevelSpec {
    /// Level number; unique and strictly increasing across the manifest
    pub level: u8,
    /// Human label for the level (e.g. "municipality")
    pub label: String,
    /// Geometry source file, relative to the dataset root
    pub file: String,
    /// Level expected to contain this one, when the dataset declares it
    #[serde(default)]
    pub parent_level: Option<u8>,
}

/// Locale and name-field configuration for result assembly.
#[derive(Debug, Clone, Deserialize)]
pub struct LocaleConfig {
    /// Key into each feature's multilingual names map
    #[serde(default = "default_name_key")]
    pub name_key: String,
    /// Joiner between node names in `summary_text`
    #[serde(default)]
    pub separator: String,
    /// Reverse summary order to finest-first (western address convention)
    #[serde(default)]
    pub fine_to_coarse: bool,
}

fn default_name_key() -> String {
    "default".to_string()
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            name_key: default_name_key(),
            separator: String::new(),
            fine_to_coarse: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawRegion {
    iso2: String,
    name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawManifest {
    dataset_id: String,
    version: String,
    checksum: String,
    region: RawRegion,
    #[serde(default)]
    locale: LocaleConfig,
    levels: Vec<LevelSpec>,
    policies: Vec<String>,
}

/// Validated dataset manifest.
#[derive(Debug, Clone)]
pub struct DatasetManifest {
    pub dataset_id: String,
    pub version: String,
    pub checksum: String,
    pub region_iso2: String,
    pub region_name: String,
    pub locale: LocaleConfig,
    /// Levels in ascending (coarsest-first) order as declared
    pub levels: Vec<LevelSpec>,
    /// Supplementation chain in declared execution order
    pub policies: Vec<PolicyKind>,
}

impl DatasetManifest {
    /// Parse and validate `manifest.json` inside `dataset_dir`.
    pub fn parse(dataset_dir: &Path) -> Result<Self, LoadError> {
        let path = dataset_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| ManifestError::new(&path, format!("cannot read manifest: {e}")))?;
        let raw: RawManifest = serde_json::from_str(&content)
            .map_err(|e| ManifestError::new(&path, format!("malformed manifest: {e}")))?;

        for (field, value) in [
            ("dataset_id", &raw.dataset_id),
            ("version", &raw.version),
            ("checksum", &raw.checksum),
            ("region.iso2", &raw.region.iso2),
            ("region.name", &raw.region.name),
        ] {
            if value.trim().is_empty() {
                return Err(ManifestError::new(&path, format!("{field} must be non-empty")).into());
            }
        }

        if raw.levels.is_empty() {
            return Err(ManifestError::new(&path, "levels must be non-empty").into());
        }
        let mut declared: HashSet<u8> = HashSet::new();
        let mut prev: Option<u8> = None;
        for spec in &raw.levels {
            if !declared.insert(spec.level) {
                return Err(
                    ManifestError::new(&path, format!("duplicate level {}", spec.level)).into(),
                );
            }
            if let Some(p) = prev {
                if spec.level <= p {
                    return Err(ManifestError::new(
                        &path,
                        format!("levels must be strictly increasing ({} after {})", spec.level, p),
                    )
                    .into());
                }
            }
            prev = Some(spec.level);
            if spec.file.trim().is_empty() {
                return Err(ManifestError::new(
                    &path,
                    format!("level {} has no geometry source file", spec.level),
                )
                .into());
            }
        }
        for spec in &raw.levels {
            if let Some(parent) = spec.parent_level {
                if parent >= spec.level || !declared.contains(&parent) {
                    return Err(ManifestError::new(
                        &path,
                        format!(
                            "level {} declares invalid parent_level {}",
                            spec.level, parent
                        ),
                    )
                    .into());
                }
            }
            let source = validated_source_path(dataset_dir, &path, &spec.file)?;
            // Existence and readability are manifest-level checks; geometry
            // content errors surface later as DatasetLoadError.
            fs::File::open(&source).map_err(|e| {
                ManifestError::new(
                    &path,
                    format!("geometry source {} is not readable: {e}", spec.file),
                )
            })?;
        }

        let mut policies = Vec::with_capacity(raw.policies.len());
        for name in &raw.policies {
            let kind = PolicyKind::from_name(name)
                .ok_or_else(|| UnknownPolicyError { name: name.clone() })?;
            policies.push(kind);
        }

        Ok(Self {
            dataset_id: raw.dataset_id,
            version: raw.version,
            checksum: raw.checksum,
            region_iso2: raw.region.iso2,
            region_name: raw.region.name,
            locale: raw.locale,
            levels: raw.levels,
            policies,
        })
    }

    /// Spec for a given level number.
    pub fn level_spec(&self, level: u8) -> Option<&LevelSpec> {
        self.levels.iter().find(|s| s.level == level)
    }
}

/// Join a declared source file onto the dataset root, rejecting escapes.
pub(crate) fn validated_source_path(
    dataset_dir: &Path,
    manifest_path: &Path,
    file: &str,
) -> Result<PathBuf, ManifestError> {
    let rel = Path::new(file);
    if rel.is_absolute() || rel.components().any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(ManifestError::new(
            manifest_path,
            format!("geometry source {file:?} must be a relative path inside the dataset"),
        ));
    }
    Ok(dataset_dir.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_manifest(dir: &Path, json: &str) {
        fs::write(dir.join(MANIFEST_FILE), json).unwrap();
    }

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "[]").unwrap();
    }

    fn valid_manifest_json() -> String {
        r#"{
            "dataset_id": "tw-admin",
            "version": "2026.08.1",
            "checksum": "sha256:abc",
            "region": { "iso2": "TW", "name": "Taiwan" },
            "locale": { "name_key": "default", "separator": "", "fine_to_coarse": false },
            "levels": [
                { "level": 4, "label": "municipality", "file": "level_4.json" },
                { "level": 7, "label": "district", "file": "level_7.json", "parent_level": 4 }
            ],
            "policies": ["parent_link_repair", "centroid_gap_fill", "localize_names"]
        }"#
        .to_string()
    }

    #[test]
    fn parses_valid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), &valid_manifest_json());
        touch(dir.path(), "level_4.json");
        touch(dir.path(), "level_7.json");

        let manifest = DatasetManifest::parse(dir.path()).unwrap();
        assert_eq!(manifest.dataset_id, "tw-admin");
        assert_eq!(manifest.levels.len(), 2);
        assert_eq!(manifest.levels[1].parent_level, Some(4));
        assert_eq!(manifest.policies.len(), 3);
        assert_eq!(manifest.region_iso2, "TW");
    }

    #[test]
    fn rejects_missing_manifest_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest(_)));
    }

    #[test]
    fn rejects_missing_required_field() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(
            dir.path(),
            r#"{ "dataset_id": "x", "version": "1", "levels": [], "policies": [] }"#,
        );
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest(_)));
    }

    #[test]
    fn rejects_non_increasing_levels() {
        let dir = tempfile::tempdir().unwrap();
        let json = valid_manifest_json().replace("\"level\": 7", "\"level\": 4");
        write_manifest(dir.path(), &json);
        touch(dir.path(), "level_4.json");
        touch(dir.path(), "level_7.json");
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest(_)));
    }

    #[test]
    fn rejects_unknown_policy() {
        let dir = tempfile::tempdir().unwrap();
        let json = valid_manifest_json().replace("centroid_gap_fill", "teleport_fill");
        write_manifest(dir.path(), &json);
        touch(dir.path(), "level_4.json");
        touch(dir.path(), "level_7.json");
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        match err {
            LoadError::UnknownPolicy(e) => assert_eq!(e.name, "teleport_fill"),
            other => panic!("expected UnknownPolicy, got {other:?}"),
        }
    }

    #[test]
    fn rejects_missing_geometry_source() {
        let dir = tempfile::tempdir().unwrap();
        write_manifest(dir.path(), &valid_manifest_json());
        touch(dir.path(), "level_4.json");
        // level_7.json deliberately absent
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest(_)));
    }

    #[test]
    fn rejects_escaping_source_path() {
        let dir = tempfile::tempdir().unwrap();
        let json = valid_manifest_json().replace("level_7.json", "../level_7.json");
        write_manifest(dir.path(), &json);
        touch(dir.path(), "level_4.json");
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest(_)));
    }

    #[test]
    fn rejects_invalid_parent_level() {
        let dir = tempfile::tempdir().unwrap();
        let json = valid_manifest_json().replace("\"parent_level\": 4", "\"parent_level\": 9");
        write_manifest(dir.path(), &json);
        touch(dir.path(), "level_4.json");
        touch(dir.path(), "level_7.json");
        let err = DatasetManifest::parse(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::Manifest(_)));
    }
}

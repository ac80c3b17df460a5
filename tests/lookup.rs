//! End-to-end lookup tests over an on-disk fixture dataset.

use std::fs;
use std::path::Path;
use std::sync::{Arc, Once};

use alder::{LoadError, LookupEngine, LookupStatus, NodeSource};

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

const FIXTURE_MANIFEST: &str = r#"{
    "dataset_id": "tw-admin",
    "version": "2026.08.1",
    "checksum": "sha256:fixture",
    "region": { "iso2": "TW", "name": "Taiwan" },
    "locale": { "name_key": "default", "separator": "", "fine_to_coarse": false },
    "levels": [
        { "level": 4, "label": "municipality", "file": "level_4.json" },
        { "level": 7, "label": "district", "file": "level_7.json", "parent_level": 4 }
    ],
    "policies": ["parent_link_repair", "centroid_gap_fill", "localize_names"]
}"#;

const FIXTURE_LEVEL_4: &str = r#"[
    {"id":"tw_r1293250","names":{"default":"臺北市","en":"Taipei"},
     "geometry":[[[[121.45,24.95],[121.67,24.95],[121.67,25.22],[121.45,25.22]]]]},
    {"id":"tw_r2524552","names":{"default":"新北市","en":"New Taipei"},
     "geometry":[[[[121.28,24.67],[121.45,24.67],[121.45,25.30],[121.28,25.30]]]]}
]"#;

const FIXTURE_LEVEL_7: &str = r#"[
    {"id":"tw_r2881027","names":{"default":"信義區","en":"Xinyi"},
     "parent_id":"tw_r1293250",
     "geometry":[[[[121.55,25.01],[121.60,25.01],[121.60,25.06],[121.55,25.06]]]]},
    {"id":"tw_r2881028","names":{"default":"大安區","en":"Daan"},
     "parent_id":"tw_r1293250",
     "geometry":[[[[121.50,25.01],[121.55,25.01],[121.55,25.06],[121.50,25.06]]]]}
]"#;

fn write_fixture(dir: &Path, version: &str) {
    init_tracing();
    fs::write(
        dir.join("manifest.json"),
        FIXTURE_MANIFEST.replace("2026.08.1", version),
    )
    .unwrap();
    fs::write(dir.join("level_4.json"), FIXTURE_LEVEL_4).unwrap();
    fs::write(dir.join("level_7.json"), FIXTURE_LEVEL_7).unwrap();
}

#[test]
fn taipei_point_resolves_city_then_district() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_fixture(dir.path(), "2026.08.1");
    let engine = LookupEngine::load(dir.path())?;

    let result = engine.lookup(25.033, 121.5654)?;
    assert_eq!(result.lookup_status, LookupStatus::Ok);
    assert_eq!(result.nodes.len(), 2);

    assert_eq!(result.nodes[0].level, 4);
    assert_eq!(result.nodes[0].id, "tw_r1293250");
    assert_eq!(result.nodes[0].name, "臺北市");
    assert_eq!(result.nodes[0].rank, 0);
    assert_eq!(result.nodes[0].source, NodeSource::Polygon);

    assert_eq!(result.nodes[1].level, 7);
    assert_eq!(result.nodes[1].id, "tw_r2881027");
    assert_eq!(result.nodes[1].name, "信義區");
    assert_eq!(result.nodes[1].rank, 1);

    assert_eq!(result.summary_text, "臺北市信義區");
    assert_eq!(result.region.iso2, "TW");
    assert_eq!(result.version, "2026.08.1");
    Ok(())
}

#[test]
fn levels_strictly_increase_in_output_order() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "2026.08.1");
    let engine = LookupEngine::load(dir.path()).unwrap();

    let result = engine.lookup(25.033, 121.5654).unwrap();
    for pair in result.nodes.windows(2) {
        assert!(pair[0].level < pair[1].level);
        assert!(pair[0].rank < pair[1].rank);
    }
}

#[test]
fn lookup_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "2026.08.1");
    let engine = LookupEngine::load(dir.path()).unwrap();

    let a = engine.lookup(25.033, 121.5654).unwrap();
    let b = engine.lookup(25.033, 121.5654).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn point_far_outside_coverage_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "2026.08.1");
    let engine = LookupEngine::load(dir.path()).unwrap();

    let result = engine.lookup(48.2, 16.37).unwrap();
    assert_eq!(result.lookup_status, LookupStatus::NotFound);
    assert!(result.nodes.is_empty());
    assert!(result.summary_text.is_empty());
}

#[test]
fn invalid_coordinates_fail_fast() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "2026.08.1");
    let engine = LookupEngine::load(dir.path()).unwrap();

    assert!(engine.lookup(120.0, 121.5).is_err());
    assert!(engine.lookup(25.0, 200.0).is_err());
}

#[test]
fn reload_swaps_version_atomically() {
    let old_dir = tempfile::tempdir().unwrap();
    let new_dir = tempfile::tempdir().unwrap();
    write_fixture(old_dir.path(), "2026.08.1");
    write_fixture(new_dir.path(), "2026.09.1");

    let engine = Arc::new(LookupEngine::load(old_dir.path()).unwrap());

    // A caller pinning the old generation keeps it across the swap.
    let pinned = engine.snapshot();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let result = engine.lookup(25.033, 121.5654).unwrap();
                    // Every observation is one full generation, never a mix.
                    assert!(
                        result.version == "2026.08.1" || result.version == "2026.09.1",
                        "unexpected version {}",
                        result.version
                    );
                    assert_eq!(result.lookup_status, LookupStatus::Ok);
                    assert_eq!(result.nodes.len(), 2);
                }
            })
        })
        .collect();

    engine.reload(new_dir.path()).unwrap();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(engine.lookup(25.033, 121.5654).unwrap().version, "2026.09.1");
    assert_eq!(
        alder::lookup_at(&pinned, 25.033, 121.5654).unwrap().version,
        "2026.08.1"
    );
}

#[test]
fn failed_reload_keeps_previous_snapshot_active() {
    let good_dir = tempfile::tempdir().unwrap();
    let bad_dir = tempfile::tempdir().unwrap();
    write_fixture(good_dir.path(), "2026.08.1");
    // bad_dir has no manifest at all

    let engine = LookupEngine::load(good_dir.path()).unwrap();
    let err = engine.reload(bad_dir.path()).unwrap_err();
    assert!(matches!(err, LoadError::Manifest(_)));

    let result = engine.lookup(25.033, 121.5654).unwrap();
    assert_eq!(result.version, "2026.08.1");
    assert_eq!(result.lookup_status, LookupStatus::Ok);
}

#[test]
fn overlapping_same_level_polygons_resolve_to_smaller_area() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "2026.08.1");
    // Overlay a second, larger level-7 polygon covering Xinyi entirely.
    fs::write(
        dir.path().join("level_7.json"),
        r#"[
            {"id":"tw_r2881027","names":{"default":"信義區"},
             "parent_id":"tw_r1293250",
             "geometry":[[[[121.55,25.01],[121.60,25.01],[121.60,25.06],[121.55,25.06]]]]},
            {"id":"tw_r9999999","names":{"default":"重疊區"},
             "parent_id":"tw_r1293250",
             "geometry":[[[[121.50,24.99],[121.65,24.99],[121.65,25.10],[121.50,25.10]]]]}
        ]"#,
    )
    .unwrap();
    let engine = LookupEngine::load(dir.path()).unwrap();

    for _ in 0..10 {
        let result = engine.lookup(25.033, 121.5654).unwrap();
        assert_eq!(result.nodes[1].id, "tw_r2881027");
    }
}

#[test]
fn localized_name_key_changes_display_names() {
    let dir = tempfile::tempdir().unwrap();
    write_fixture(dir.path(), "2026.08.1");
    let manifest = FIXTURE_MANIFEST.replace("\"name_key\": \"default\"", "\"name_key\": \"en\"");
    fs::write(dir.path().join("manifest.json"), manifest).unwrap();

    let engine = LookupEngine::load(dir.path()).unwrap();
    let result = engine.lookup(25.033, 121.5654).unwrap();
    assert_eq!(result.nodes[0].name, "Taipei");
    assert_eq!(result.nodes[1].name, "Xinyi");
    assert_eq!(result.summary_text, "TaipeiXinyi");
}

use std::fs;
use std::path::{Path, PathBuf};

use common::config_store::ConfigStore;
use common::{PoseConfig, TransformConfig, TransformFeature, UpVectorType};

fn get_test_dir(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("pose_d_test_{}", name));
    cleanup_test_dir(&path);
    let _ = fs::create_dir_all(&path);
    path
}

fn cleanup_test_dir(path: &Path) {
    let _ = fs::remove_dir_all(path);
}

#[test]
fn missing_file_keeps_defaults() {
    let dir = get_test_dir("missing");
    let mut store = ConfigStore::new(dir.join("config.json"));

    store.load().expect("load should succeed without a file");

    assert_eq!(store.data, PoseConfig::default());
    assert!(!store.path().exists());
    cleanup_test_dir(&dir);
}

#[test]
fn load_or_create_writes_defaults() {
    let dir = get_test_dir("create");
    let path = dir.join("nested").join("config.json");
    let mut store = ConfigStore::new(&path);

    store.load_or_create().expect("defaults should be written");

    assert!(path.exists());
    let mut reloaded = ConfigStore::new(&path);
    reloaded.load().unwrap();
    assert_eq!(reloaded.data, PoseConfig::default());
    assert!(reloaded.data.configs[0]
        .thresholds_for(TransformFeature::PalmUp)
        .is_some());
    cleanup_test_dir(&dir);
}

#[test]
fn save_and_load_round_trip() {
    let dir = get_test_dir("round_trip");
    let path = dir.join("config.json");

    let mut store = ConfigStore::new(&path);
    store.data.provider.disable_proactive_evaluation = true;
    store
        .data
        .configs
        .push(TransformConfig::new(7).with_up_vector(UpVectorType::Tracking));
    store.save().expect("save should succeed");

    let mut loaded = ConfigStore::new(&path);
    loaded.load().expect("load should succeed");

    assert_eq!(loaded.data, store.data);
    cleanup_test_dir(&dir);
}

#[test]
fn partial_file_uses_defaults_for_the_rest() {
    let dir = get_test_dir("partial");
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{ "provider": { "disable_proactive_evaluation": true }, "realtime": true }"#,
    )
    .unwrap();

    let mut store = ConfigStore::new(&path);
    store.load().unwrap();

    assert!(store.data.provider.disable_proactive_evaluation);
    assert!(store.data.realtime);
    assert_eq!(store.data.frames_path, "frames.jsonl");
    assert_eq!(store.data.configs, PoseConfig::default().configs);
    cleanup_test_dir(&dir);
}

#[test]
fn duplicate_config_ids_fail_to_load() {
    let dir = get_test_dir("duplicates");
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{
            "configs": [
                { "instance_id": 4, "up_vector_type": "World" },
                { "instance_id": 4, "up_vector_type": "Head" },
                { "instance_id": 5 }
            ]
        }"#,
    )
    .unwrap();

    let mut store = ConfigStore::new(&path);
    let err = store.load().unwrap_err();

    assert!(format!("{:#}", err).contains("id 4"), "{:#}", err);
    assert_eq!(store.data, PoseConfig::default());
    assert!(store.load_or_create().is_err());
    cleanup_test_dir(&dir);
}

#[test]
fn default_config_has_palm_up_thresholds() {
    let config = PoseConfig::default();

    let spec = config.configs[0]
        .thresholds_for(TransformFeature::PalmUp)
        .expect("default config should carry PalmUp thresholds");
    assert!(spec.band("PalmUp").is_some());
    assert!(spec.band("PalmAway").is_some());
    assert_eq!(config.watches[0].config_id, config.configs[0].instance_id);
    assert_eq!(config.watches[0].feature, TransformFeature::PalmUp);
}

#[test]
fn invalid_thresholds_fail_to_load() {
    let dir = get_test_dir("invalid");
    let path = dir.join("config.json");
    fs::write(
        &path,
        r#"{
            "configs": [
                {
                    "instance_id": 1,
                    "feature_thresholds": {
                        "PalmUp": { "bands": [] }
                    }
                }
            ]
        }"#,
    )
    .unwrap();

    let mut store = ConfigStore::new(&path);
    assert!(store.load().is_err());
    assert_eq!(store.data, PoseConfig::default());
    cleanup_test_dir(&dir);
}

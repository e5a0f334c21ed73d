//! Config and state living side by side under `~/.cicd`.

use assert_fs::prelude::*;
use chrono::Utc;
use cicd_core::{
    config,
    state::{self, PipelineRecord, StateFile},
    types::PipelineKind,
    ConfigError,
};
use predicates::prelude::predicate;

#[test]
fn loading_config_creates_nothing() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cfg = config::load_at(home.path()).expect("load");
    assert_eq!(cfg.store_dir, home.path().join(".cicd").join("store"));
    home.child(".cicd").assert(predicate::path::missing());
}

#[test]
fn saving_state_leaves_config_untouched() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let config_file = home.child(".cicd/config.yaml");
    config_file
        .write_str("api_root: https://cp.example.com/\n")
        .expect("write");

    let mut file = StateFile::default();
    file.pipelines.insert(
        "job".into(),
        PipelineRecord {
            kind: PipelineKind::Script,
            handle: None,
            updated_at: Utc::now(),
        },
    );
    state::save_at(home.path(), &file).expect("save");

    home.child(".cicd/state.yaml")
        .assert(predicate::str::contains("kind: script"));
    home.child(".cicd/state.yaml.tmp")
        .assert(predicate::path::missing());
    config_file.assert("api_root: https://cp.example.com/\n");

    let cfg = config::load_at(home.path()).expect("load");
    cfg.validate().expect("valid");
}

#[test]
fn blank_flag_falls_through_to_env() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let cfg = config::load_at(home.path())
        .expect("load")
        .with_api_root(Some(String::new()), Some("http://env".into()));
    assert_eq!(cfg.api_root, "http://env");
}

#[test]
fn non_http_api_root_fails_validation() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".cicd/config.yaml")
        .write_str("api_root: ftp://cp.example.com\n")
        .expect("write");

    let err = config::load_at(home.path())
        .expect("load")
        .validate()
        .unwrap_err();
    assert!(
        matches!(err, ConfigError::Invalid { field: "api_root", .. }),
        "got: {err}"
    );
    assert!(err.to_string().contains("ftp://cp.example.com"));
}

#[test]
fn category_with_slash_fails_validation() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    home.child(".cicd/config.yaml")
        .write_str("api_root: http://cp\ncategory: a/b\n")
        .expect("write");

    let err = config::load_at(home.path())
        .expect("load")
        .validate()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "category", .. }));
}

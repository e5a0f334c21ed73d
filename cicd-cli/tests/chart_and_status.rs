use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

use cicd_core::state;

fn cicd_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("cicd"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("CICD_API_ROOT")
        .env("RUST_LOG", "warn")
        .env("NO_COLOR", "1");
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    fs::write(path, content).expect("write fixture");
}

fn demo_chart() -> TempDir {
    let dir = TempDir::new().expect("chart dir");
    write(dir.path(), "Chart.yaml", "apiVersion: v2\nname: demo\nversion: 0.1.0\n");
    write(dir.path(), "values.yaml", "replicas: 1\n");
    write(dir.path(), "templates/deployment.yaml", "kind: Deployment\n");
    dir
}

#[test]
fn chart_build_publishes_and_records() {
    let home = TempDir::new().expect("home");
    let chart = demo_chart();

    cicd_cmd(home.path())
        .args(["chart", "build"])
        .arg(chart.path())
        .args(["--set", "replicas=3", "--label", "web"])
        .assert()
        .success()
        .stdout(contains("built web"))
        .stdout(contains("archive: helm/demo-"));

    let state = state::load_at(home.path()).expect("state");
    let record = state.charts.get("web").expect("recorded");
    assert_eq!(record.name.as_str(), "demo");
    assert_eq!(record.hash.len(), 64);
    assert!(record.archive.ends_with(&format!("-{}.zip", record.id)));

    let stored = home.path().join(".cicd").join("store").join(&record.archive);
    let bytes = fs::read(&stored).expect("stored archive");
    let mut zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("zip");
    let mut overrides = String::new();
    std::io::Read::read_to_string(&mut zip.by_name("override.txt").expect("member"), &mut overrides)
        .expect("read");
    assert_eq!(overrides, "--set 'replicas'='3'");
}

#[test]
fn chart_status_reports_missing_object() {
    let home = TempDir::new().expect("home");
    let chart = demo_chart();
    cicd_cmd(home.path())
        .args(["chart", "build"])
        .arg(chart.path())
        .assert()
        .success();

    cicd_cmd(home.path())
        .args(["chart", "status", "demo"])
        .assert()
        .success()
        .stdout(contains("present demo"));

    fs::remove_dir_all(home.path().join(".cicd").join("store")).expect("wipe store");
    cicd_cmd(home.path())
        .args(["chart", "status", "demo"])
        .assert()
        .success()
        .stdout(contains("missing demo"));

    let record = state::load_at(home.path()).expect("state").charts["demo"].clone();
    assert!(record.needs_rebuild());
}

#[test]
fn chart_remove_forgets_the_record() {
    let home = TempDir::new().expect("home");
    let chart = demo_chart();
    cicd_cmd(home.path())
        .args(["chart", "build"])
        .arg(chart.path())
        .assert()
        .success();

    cicd_cmd(home.path())
        .args(["chart", "remove", "demo"])
        .assert()
        .success()
        .stdout(contains("removed demo"));
    assert!(state::load_at(home.path()).expect("state").charts.is_empty());
}

#[test]
fn missing_values_file_fails_with_path() {
    let home = TempDir::new().expect("home");
    let chart = demo_chart();
    fs::remove_file(chart.path().join("values.yaml")).expect("rm values");

    cicd_cmd(home.path())
        .args(["chart", "build"])
        .arg(chart.path())
        .assert()
        .failure()
        .stderr(contains("values.yaml"));
    assert!(state::load_at(home.path()).expect("state").charts.is_empty());
}

#[test]
fn status_json_lists_recorded_charts() {
    let home = TempDir::new().expect("home");
    let chart = demo_chart();
    cicd_cmd(home.path())
        .args(["chart", "build"])
        .arg(chart.path())
        .assert()
        .success();

    let output = cicd_cmd(home.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(json["charts"][0]["label"], "demo");
    assert_eq!(json["charts"][0]["name"], "demo");
    assert_eq!(json["pipelines"], serde_json::json!([]));
}

#[test]
fn status_on_fresh_home_is_empty() {
    let home = TempDir::new().expect("home");
    cicd_cmd(home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("Nothing recorded yet."));
}

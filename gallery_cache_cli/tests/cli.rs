use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// A command isolated from the user's config and store
fn cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gallery-cache").unwrap();
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .env("GALLERY_CACHE_STORE__VERSION", "test")
        .env_remove("RUST_LOG")
        .arg("--store")
        .arg(store_path(temp_dir));
    cmd
}

fn store_path(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("store.json")
}

fn put(temp_dir: &TempDir, cache_type: &str, json: &str, id: Option<&str>) {
    let mut command = cmd(temp_dir);
    command.arg("put").arg(cache_type).arg(json);
    if let Some(id) = id {
        command.arg("--id").arg(id);
    }
    command.assert().success();
}

#[test]
fn test_version() {
    let mut cmd = Command::cargo_bin("gallery-cache").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_put_then_get() {
    let temp_dir = TempDir::new().unwrap();
    put(&temp_dir, "images", r#"{"images":["img1"],"count":1}"#, Some("brandA"));

    cmd(&temp_dir)
        .args(["get", "images", "--id", "brandA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"img1\""))
        .stdout(predicate::str::contains("\"count\": 1"));

    assert!(Path::new(&store_path(&temp_dir)).exists());
}

#[test]
fn test_get_miss_exits_with_error() {
    let temp_dir = TempDir::new().unwrap();

    cmd(&temp_dir)
        .args(["get", "brands"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Not cached"));
}

#[test]
fn test_put_rejects_invalid_json() {
    let temp_dir = TempDir::new().unwrap();

    cmd(&temp_dir)
        .args(["put", "brands", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Payload is not valid JSON"));
}

#[test]
fn test_list_json() {
    let temp_dir = TempDir::new().unwrap();
    put(&temp_dir, "brands", r#"["Nanyi"]"#, None);
    put(&temp_dir, "brand_detail", r#"{"id":7}"#, Some("7"));

    let output = cmd(&temp_dir)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["type"], "brand_detail");
    assert_eq!(rows[0]["identifier"], "7");
    assert_eq!(rows[1]["type"], "brands");
}

#[test]
fn test_stats_text() {
    let temp_dir = TempDir::new().unwrap();
    put(&temp_dir, "images", "[1]", Some("a"));
    put(&temp_dir, "images", "[2]", Some("b"));

    cmd(&temp_dir)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Entries: 2"))
        .stdout(predicate::str::contains("images: 2"));
}

#[test]
fn test_clear_type_and_all() {
    let temp_dir = TempDir::new().unwrap();
    put(&temp_dir, "brand", "1", Some("a"));
    put(&temp_dir, "brand_detail", "2", Some("a"));
    put(&temp_dir, "filters", "3", None);

    cmd(&temp_dir)
        .args(["clear", "brand"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Cleared 1 entries"));

    cmd(&temp_dir)
        .args(["get", "brand_detail", "--id", "a"])
        .assert()
        .success();

    cmd(&temp_dir)
        .arg("clear")
        .assert()
        .success()
        .stderr(predicate::str::contains("Cleared 2 entries"));
}

#[test]
fn test_clear_id_requires_type() {
    let temp_dir = TempDir::new().unwrap();

    cmd(&temp_dir)
        .args(["clear", "--id", "a"])
        .assert()
        .failure();
}

#[test]
fn test_evict_validates_fraction() {
    let temp_dir = TempDir::new().unwrap();

    cmd(&temp_dir)
        .args(["evict", "--fraction", "2"])
        .assert()
        .failure();

    put(&temp_dir, "images", "1", Some("a"));
    put(&temp_dir, "images", "2", Some("b"));
    cmd(&temp_dir)
        .args(["evict", "--fraction", "0.5"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Evicted 1 entries"));
}

#[test]
fn test_sweep_runs() {
    let temp_dir = TempDir::new().unwrap();
    put(&temp_dir, "images", "1", Some("a"));

    cmd(&temp_dir)
        .arg("sweep")
        .assert()
        .success()
        .stderr(predicate::str::contains("Removed 0 expired entries"));
}

#[test]
fn test_version_change_flushes_store() {
    let temp_dir = TempDir::new().unwrap();
    put(&temp_dir, "brands", "[1]", None);

    cmd(&temp_dir)
        .env("GALLERY_CACHE_STORE__VERSION", "next")
        .args(["get", "brands"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn test_config_set_get_and_path() {
    let temp_dir = TempDir::new().unwrap();

    cmd(&temp_dir)
        .args(["config", "set", "store.preset", "standard"])
        .assert()
        .success();

    cmd(&temp_dir)
        .args(["config", "get", "store.preset"])
        .assert()
        .success()
        .stdout(predicate::str::diff("standard\n"));

    cmd(&temp_dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gallery-cache"))
        .stdout(predicate::str::contains("config.toml"));

    cmd(&temp_dir)
        .args(["config", "set", "storage.backend", "redis"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_standard_preset_changes_ttl() {
    let temp_dir = TempDir::new().unwrap();
    cmd(&temp_dir)
        .args(["config", "set", "store.preset", "standard"])
        .assert()
        .success();

    cmd(&temp_dir)
        .args(["put", "brands", "[]"])
        .assert()
        .success()
        .stderr(predicate::str::contains("for 3600s"));
}

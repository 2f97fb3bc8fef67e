//! CLI integration tests.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn wharf() -> Command {
    let mut cmd = Command::cargo_bin("wharf").unwrap();
    // Keep the tests independent of the caller's toolchain environment.
    cmd.env_remove("IDF_TARGET");
    cmd.env_remove("IDF_VERSION");
    cmd
}

#[test]
fn test_schema_prints_json_schema() {
    wharf()
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"$schema\""))
        .stdout(predicate::str::contains("\"dependencies\""));
}

#[test]
fn test_validate_reports_valid_manifest() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("wharf.yml"),
        "version: \"1.0.0\"\ndependencies:\n  idf: \">=4.4\"\n",
    )
    .unwrap();

    wharf()
        .args(["validate", "--project-dir"])
        .arg(tmp.path())
        .args(["--target", "esp32", "--idf-version", "4.4.4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: main (1 dependencies)"));
}

#[test]
fn test_validate_collects_all_errors() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("wharf.yml"),
        "unknown: 1\nversion: \"not-semver\"\ntargets: [esp123]\n",
    )
    .unwrap();

    wharf()
        .args(["validate", "--project-dir"])
        .arg(tmp.path())
        .args(["--target", "esp32", "--idf-version", "4.4.4"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unknown keys: unknown"))
        .stderr(predicate::str::contains("valid semantic version"))
        .stderr(predicate::str::contains("unknown targets: esp123"));
}

#[test]
fn test_resolve_writes_lock_file() {
    let tmp = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("wharf.yml"),
        "dependencies:\n  idf: \">=4.4\"\n",
    )
    .unwrap();

    wharf()
        .args(["resolve", "--project-dir"])
        .arg(tmp.path())
        .args(["--target", "esp32", "--idf-version", "4.4.4"])
        .arg("--cache-path")
        .arg(cache.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("resolved 1 component(s)"))
        .stdout(predicate::str::contains("idf 4.4.4"));

    let lock = fs::read_to_string(tmp.path().join("dependencies.lock")).unwrap();
    assert!(lock.contains("type: idf"));
    assert!(lock.contains("version: 4.4.4"));
    assert!(lock.contains("target: esp32"));
}

#[test]
fn test_resolve_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    fs::write(tmp.path().join("wharf.yml"), "").unwrap();

    let run = |tmp: &TempDir, cache: &TempDir| {
        wharf()
            .args(["resolve", "--project-dir"])
            .arg(tmp.path())
            .args(["--target", "esp32", "--idf-version", "4.4.4"])
            .arg("--cache-path")
            .arg(cache.path())
            .assert()
            .success();
    };

    run(&tmp, &cache);
    let first = fs::read(tmp.path().join("dependencies.lock")).unwrap();
    run(&tmp, &cache);
    let second = fs::read(tmp.path().join("dependencies.lock")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_resolve_unresolvable_conflict_exits_one() {
    let tmp = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();
    // The toolchain pseudo-component can never satisfy a constraint above
    // the active toolchain version.
    fs::write(
        tmp.path().join("wharf.yml"),
        "dependencies:\n  idf: \">=9.9\"\n",
    )
    .unwrap();

    wharf()
        .args(["resolve", "--project-dir"])
        .arg(tmp.path())
        .args(["--target", "esp32", "--idf-version", "4.4.4"])
        .arg("--cache-path")
        .arg(cache.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("idf"))
        .stderr(predicate::str::contains(">=9.9"));
}

#[test]
fn test_cache_path_size_and_clear() {
    let cache = TempDir::new().unwrap();
    let cache_path = cache.path().join("components");

    wharf()
        .args(["cache", "--cache-path"])
        .arg(&cache_path)
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("components"));

    wharf()
        .args(["cache", "--cache-path"])
        .arg(&cache_path)
        .arg("size")
        .assert()
        .success()
        .stdout(predicate::str::contains("0"));

    wharf()
        .args(["cache", "--cache-path"])
        .arg(&cache_path)
        .arg("clear")
        .assert()
        .success()
        .stdout(predicate::str::contains("cache cleared"));
}

#[test]
fn test_local_path_dependency_resolves() {
    let tmp = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    let dep = tmp.path().join("board_support");
    fs::create_dir_all(&dep).unwrap();
    fs::write(dep.join("wharf.yml"), "version: \"0.1.0\"\n").unwrap();

    let project = tmp.path().join("app");
    fs::create_dir_all(&project).unwrap();
    fs::write(
        project.join("wharf.yml"),
        "dependencies:\n  board_support:\n    path: \"../board_support\"\n",
    )
    .unwrap();

    wharf()
        .args(["resolve", "--project-dir"])
        .arg(&project)
        .args(["--target", "esp32", "--idf-version", "4.4.4"])
        .arg("--cache-path")
        .arg(cache.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("board_support 0.1.0"));

    let lock = fs::read_to_string(project.join("dependencies.lock")).unwrap();
    assert!(lock.contains("type: local"));
}

//! Conformance tests that run YAML fixtures against the HTTP primitives
//!
//! Run with: cargo test -p gatecond-test --features fixtures

#![cfg(feature = "fixtures")]

use std::fs;
use std::path::{Path, PathBuf};

use gatecond_test::fixture::Fixture;
use gatecond_test::rule_fixture::RuleFixture;

fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// YAML files in `dir`, sorted by name.
fn yaml_files(dir: &Path) -> Vec<PathBuf> {
    assert!(dir.exists(), "Fixtures directory does not exist: {}", dir.display());
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .collect();
    files.sort();
    files
}

fn run_condition_fixture(file: &str) {
    let path = fixtures_dir().join("conditions").join(file);
    let yaml = fs::read_to_string(&path).expect("read yaml");
    let fixtures = Fixture::from_yaml_multi(&yaml)
        .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()));
    assert!(!fixtures.is_empty(), "{} has no fixtures", path.display());
    for fixture in fixtures {
        println!("  Running: {}", fixture.name);
        fixture.run_and_assert();
    }
}

#[test]
fn test_request_line() {
    run_condition_fixture("01_request_line.yaml");
}

#[test]
fn test_addresses() {
    run_condition_fixture("02_addresses.yaml");
}

#[test]
fn test_path_and_query() {
    run_condition_fixture("03_path_query.yaml");
}

#[test]
fn test_headers_and_cookies() {
    run_condition_fixture("04_headers_cookies.yaml");
}

#[test]
fn test_session_and_response() {
    run_condition_fixture("05_session_response.yaml");
}

#[test]
fn test_time() {
    run_condition_fixture("06_time.yaml");
}

#[test]
fn test_language() {
    run_condition_fixture("07_language.yaml");
}

#[test]
fn test_templates() {
    run_condition_fixture("08_templates.yaml");
}

#[test]
fn test_every_condition_fixture_file_is_listed() {
    let files = yaml_files(&fixtures_dir().join("conditions"));
    assert_eq!(files.len(), 8);
}

#[test]
fn test_rule_files() {
    for path in yaml_files(&fixtures_dir().join("rules")) {
        println!("Running rule fixture: {}", path.display());
        let yaml = fs::read_to_string(&path).expect("read yaml");
        let fixtures = RuleFixture::from_yaml_multi(&yaml)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()));
        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

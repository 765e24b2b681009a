//! Shared fixtures for integration tests.
#![allow(dead_code)]

use minreqs_core::StaticProvider;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) const PYPROJECT: &str = r#"[build-system]
requires = ["hatchling"]
build-backend = "hatchling.build"

[project]
name = "myproject"
version = "0.1.0"
description = "My project"
dependencies = ["requests>=2.0.0", "numpy"]
"#;

/// A fake index where `numpy` starts at 1.3.0 and `requests` at 2.0.0.
pub(crate) fn index() -> Arc<StaticProvider> {
    Arc::new(
        StaticProvider::new()
            .with_package("numpy", ["1.4.1", "1.4.0", "1.3.0", "1.4.0rc1"])
            .with_package("requests", ["2.31.0", "2.1.0", "2.0.0", "1.2.3"]),
    )
}

pub(crate) fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Writes `content` to `pyproject.toml` in a fresh temporary directory.
pub(crate) fn project(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("pyproject.toml");
    std::fs::write(&path, content).expect("Failed to write pyproject.toml");
    (dir, path)
}

// tests/common.rs

#![allow(dead_code)]

use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

// Helper function to get the binary command
pub fn rulewalk_cmd() -> Command {
    Command::cargo_bin("rulewalk").expect("Failed to find rulewalk binary")
}

/// Creates a file (and its parent directories) under `root`.
pub fn create_file(root: &Path, relative_path: &str, content: &str) {
    let file_path = root.join(relative_path);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(&file_path, content).expect("Failed to write file");
}

/// A temp directory with its path canonicalized, so lexical path
/// comparisons in the enumerator line up with what tests construct.
pub fn project_dir() -> (TempDir, PathBuf) {
    let temp = tempfile::tempdir().expect("Failed to create temp dir");
    let root = temp
        .path()
        .canonicalize()
        .expect("Failed to canonicalize temp dir");
    (temp, root)
}

//! Shared test utilities for texlipse.
//!
//! This module provides common helpers used across multiple test modules.
//! It is only compiled when running tests.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::Settings;
use crate::project::Project;

/// Creates a temporary project directory for testing.
///
/// Returns the temp directory handle, which must outlive the test, and the
/// project root inside it. The root is a non-hidden subdirectory because
/// temp directories are sometimes created as `/tmp/.tmpXXXXX` and hidden
/// paths are never indexed.
pub fn create_test_project_dir() -> (TempDir, PathBuf) {
    let _ = env_logger::builder().is_test(true).try_init();
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let project_dir = temp_dir.path().join("project");
    fs::create_dir(&project_dir).expect("Failed to create project subdirectory");
    (temp_dir, project_dir)
}

/// Writes `files` (root-relative name, content) into a fresh project
/// directory and constructs the project with default settings.
///
/// ```ignore
/// let (_temp_dir, root, project) = create_test_project(&[("main.tex", "\\label{a}")]);
/// ```
pub fn create_test_project(files: &[(&str, &str)]) -> (TempDir, PathBuf, Project) {
    let (temp_dir, project_dir) = create_test_project_dir();
    for (name, content) in files {
        let path = project_dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write test file");
    }
    let project = Project::construct(&Settings::default(), &project_dir)
        .expect("Failed to construct test project");
    (temp_dir, project_dir, project)
}

//! Test utilities for artus-util
//!
//! This module provides common test fixtures and utilities to reduce
//! duplication in test code across the codebase.

#![cfg(test)]

use crate::config::CommandSettings;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch area with a private `bin/` directory for fake executables
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub bin_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let bin_dir = temp_dir.path().join("bin");
        std::fs::create_dir(&bin_dir).expect("Failed to create bin dir");
        Self { temp_dir, bin_dir }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Install an executable shell script named `name` in `bin/`
    pub fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.bin_dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("Failed to write script");
        make_executable(&path);
        path
    }

    /// Command settings rooted in this environment, with `bin/` first on
    /// `PATH`, a neutral locale and no back-off
    pub fn command_settings(&self) -> CommandSettings {
        CommandSettings {
            working_dir: self.path().to_path_buf(),
            home: self.path().to_path_buf(),
            locale: "C".to_string(),
            path: format!("{}:/usr/bin:/bin", self.bin_dir.display()),
            backoff_ms: 0,
            working_copy_root: self.path().join("wc").display().to_string(),
            ..CommandSettings::default()
        }
    }

    /// Write an htpasswd file listing `users`
    pub fn write_htpasswd(&self, users: &[&str]) -> PathBuf {
        let path = self.path().join("htpasswd");
        let content: String = users.iter().map(|u| format!("{u}:$apr1$test\n")).collect();
        std::fs::write(&path, content).expect("Failed to write htpasswd");
        path
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

pub fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)
        .expect("Failed to read metadata")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).expect("Failed to set permissions");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;
        let env = TestEnvironment::new();
        let script = env.write_script("hello", "echo hi\n");
        let mode = std::fs::metadata(script).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }

    #[test]
    fn test_htpasswd_fixture() {
        let env = TestEnvironment::new();
        let path = env.write_htpasswd(&["a.b", "c"]);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a.b:$apr1$test\nc:$apr1$test\n");
    }
}

//! Common test utilities for mcp-gearbox integration tests.
//!
//! Provides `TestEnv`, an isolated HOME and PATH per test so nothing on the
//! developer's machine (a real uv, python or mcp-cli) leaks into results.

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an empty home directory and a private PATH.
///
/// `mcp()` and `install()` return commands whose `HOME`, `USERPROFILE` and
/// `PATH` point into the environment, making tests parallel-safe.
pub struct TestEnv {
    pub home_dir: TempDir,
    pub bin_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home_dir: TempDir::new().unwrap(),
            bin_dir: TempDir::new().unwrap(),
        }
    }

    pub fn mcp(&self) -> Command {
        Command::from_std(self.mcp_process())
    }

    /// `mcp` as a plain process, for tests that signal it while it runs.
    pub fn mcp_process(&self) -> std::process::Command {
        self.command(env!("CARGO_BIN_EXE_mcp"))
    }

    pub fn install(&self) -> Command {
        Command::from_std(self.command(env!("CARGO_BIN_EXE_mcp-gearbox-install")))
    }

    fn command(&self, program: &str) -> std::process::Command {
        let mut cmd = std::process::Command::new(program);
        cmd.current_dir(self.home_dir.path())
            .env("HOME", self.home_dir.path())
            .env("USERPROFILE", self.home_dir.path())
            .env("PATH", self.bin_dir.path())
            .env_remove("MCP_GEARBOX_TIMEOUT_SECS")
            .env_remove("MCP_GEARBOX_LOG");
        cmd
    }

    pub fn home_path(&self) -> &Path {
        self.home_dir.path()
    }

    pub fn bin_path(&self) -> &Path {
        self.bin_dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.home_path().join(".mcpgearbox").join("config.json")
    }

    pub fn read_config(&self) -> serde_json::Value {
        let contents = fs::read_to_string(self.config_path()).unwrap();
        serde_json::from_str(&contents).unwrap()
    }

    pub fn write_config(&self, install_method: &str, executable_path: &Path) {
        let config = serde_json::json!({
            "installMethod": install_method,
            "executablePath": executable_path.to_string_lossy(),
            "installedAt": "2025-01-01T00:00:00.000Z",
        });
        fs::create_dir_all(self.config_path().parent().unwrap()).unwrap();
        fs::write(self.config_path(), config.to_string()).unwrap();
    }

    /// Write an executable shell script named `name` into the PATH directory.
    #[cfg(unix)]
    pub fn script_on_path(&self, name: &str, body: &str) -> PathBuf {
        write_script(&self.bin_path().join(name), body)
    }

    /// Write an executable shell script at `~/.local/bin/<name>`.
    #[cfg(unix)]
    pub fn script_in_default_install(&self, name: &str, body: &str) -> PathBuf {
        let dir = self.home_path().join(".local").join("bin");
        fs::create_dir_all(&dir).unwrap();
        write_script(&dir.join(name), body)
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
    path.to_path_buf()
}

//! Priority config persisted by the installer and read by the resolver.
//!
//! The file lives at `~/.mcpgearbox/config.json`:
//!
//! ```json
//! {
//!   "installMethod": "uv",
//!   "executablePath": "/home/u/.local/bin/mcp-cli",
//!   "installedAt": "2025-01-01T12:00:00Z"
//! }
//! ```
//!
//! Readers never fail: a missing, truncated or otherwise unusable file is
//! treated as "no directive".

use crate::Result;
use crate::tool::{MODULE_FLAG, MODULE_NAME};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Package manager that installed the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallMethod {
    /// `uv tool install`, a standalone executable.
    Uv,
    /// `pip install`, run through a Python interpreter.
    Pip,
}

impl std::fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstallMethod::Uv => write!(f, "uv"),
            InstallMethod::Pip => write!(f, "pip"),
        }
    }
}

/// The record written after a successful install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityConfig {
    pub install_method: InstallMethod,

    /// For `uv` the executable itself; for `pip` the full
    /// `<interpreter> -m mcp_cli` command line.
    pub executable_path: String,

    pub installed_at: DateTime<Utc>,
}

impl PriorityConfig {
    pub fn new(install_method: InstallMethod, executable_path: impl Into<String>) -> Self {
        Self {
            install_method,
            executable_path: executable_path.into(),
            installed_at: Utc::now(),
        }
    }

    /// Interpreter part of a `pip` directive.
    ///
    /// `"/usr/bin/python3 -m mcp_cli"` yields `"/usr/bin/python3"`. The known
    /// `-m mcp_cli` suffix is stripped first so interpreter paths containing
    /// spaces survive; anything else falls back to the first whitespace
    /// separated segment.
    pub fn interpreter(&self) -> Option<&str> {
        let trimmed = self.executable_path.trim();
        let suffix = format!(" {} {}", MODULE_FLAG, MODULE_NAME);
        let interpreter = match trimmed.strip_suffix(suffix.as_str()) {
            Some(prefix) => prefix.trim_end(),
            None => trimmed.split_whitespace().next()?,
        };
        (!interpreter.is_empty()).then_some(interpreter)
    }

    fn is_valid(&self) -> bool {
        !self.executable_path.trim().is_empty()
    }
}

/// Reads and writes the priority config at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the standard location under `home`.
    pub fn in_home(home: &Path) -> Self {
        Self::new(crate::tool::config_path(home))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config, treating every failure as absence.
    pub fn read(&self) -> Option<PriorityConfig> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::debug!("ignoring unreadable config {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<PriorityConfig>(&contents) {
            Ok(config) if config.is_valid() => Some(config),
            Ok(_) => {
                tracing::debug!("ignoring config with empty executablePath");
                None
            }
            Err(e) => {
                tracing::debug!("ignoring unparsable config {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Write the config pretty-printed, replacing any previous file.
    ///
    /// The content goes to a temporary file in the same directory which is
    /// then renamed over the target, so readers see either the old or the new
    /// record.
    pub fn write(&self, config: &PriorityConfig) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut json = serde_json::to_string_pretty(config).map_err(io::Error::from)?;
        json.push('\n');

        let mut file = NamedTempFile::new_in(parent)?;
        file.write_all(json.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;

        Ok(())
    }
}

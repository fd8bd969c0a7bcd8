//! The slice of the operating system that discovery and installation depend on.
//!
//! Resolution is inherently environment-dependent, so every lookup goes
//! through [`Host`]. [`SystemHost`] talks to the real machine; tests supply a
//! fake with a fixed home directory, PATH table and file set.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Upper bound for a quiet probe such as `python3 -c "import mcp_cli"`.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub trait Host {
    /// The user's home directory (`HOME` / `USERPROFILE`).
    fn home_dir(&self) -> Option<PathBuf>;

    /// Resolve a bare command name against PATH.
    fn which(&self, name: &str) -> Option<PathBuf>;

    fn is_file(&self, path: &Path) -> bool;

    /// Whether `path` is the currently running launcher binary.
    fn is_self(&self, path: &Path) -> bool;

    /// Run a command quietly and report whether it exited 0.
    ///
    /// Spawn failures, non-zero exits and overruns all count as `false`.
    fn probe(&self, program: &Path, args: &[String]) -> bool;

    /// Run a command with inherited stdio and report whether it exited 0.
    fn run(&self, program: &Path, args: &[String]) -> std::io::Result<bool>;
}

/// [`Host`] backed by the real environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_self(&self, path: &Path) -> bool {
        let Ok(current) = std::env::current_exe().and_then(|p| p.canonicalize()) else {
            return false;
        };
        path.canonicalize().map(|p| p == current).unwrap_or(false)
    }

    fn probe(&self, program: &Path, args: &[String]) -> bool {
        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                tracing::debug!("probe {} failed to start: {}", program.display(), e);
                return false;
            }
        };

        match child.wait_timeout(PROBE_TIMEOUT) {
            Ok(Some(status)) => status.success(),
            Ok(None) => {
                tracing::debug!("probe {} timed out", program.display());
                let _ = child.kill();
                let _ = child.wait();
                false
            }
            Err(_) => {
                let _ = child.kill();
                let _ = child.wait();
                false
            }
        }
    }

    fn run(&self, program: &Path, args: &[String]) -> std::io::Result<bool> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.success())
    }
}

//! mcp-gearbox - a launcher and installer for the `mcp-cli` tool.
//!
//! This library backs the `mcp` and `mcp-gearbox-install` binaries. The
//! installer records which package manager succeeded in
//! `~/.mcpgearbox/config.json`; the resolver reads that record on every call
//! and falls back to discovery when it is missing or stale.
//!
//! # Resolution order
//!
//! ```text
//! 1. config directive   (uv: recorded path, pip: <python> -m mcp_cli)
//! 2. default uv install (~/.local/bin/mcp-cli)
//! 3. interpreter probe  (python3, python, py with `import mcp_cli`)
//! 4. bare PATH lookup   (mcp-cli)
//! 5. NotFound
//! ```
//!
//! # Example
//!
//! ```no_run
//! use mcp_gearbox::{InvocationRequest, Launcher, StdioMode};
//!
//! let launcher = Launcher::system();
//! let request = InvocationRequest::new("list -a continue -j").stdio(StdioMode::Pipe);
//! let result = launcher.execute(&request)?;
//! println!("{}", result.stdout);
//! # Ok::<(), mcp_gearbox::Error>(())
//! ```

use std::path::PathBuf;
use std::time::Duration;

pub mod config;
pub mod exec;
pub mod host;
pub mod install;
pub mod launcher;
pub mod logging;
pub mod resolver;
pub mod tool;

pub use config::{ConfigStore, InstallMethod, PriorityConfig};
pub use exec::{CancelHandle, InvocationRequest, InvocationResult, StdioMode};
pub use host::{Host, SystemHost};
pub use install::{InstallOutcome, Installer};
pub use launcher::Launcher;
pub use resolver::{Invocation, Resolver, Source, ToolArgs};

/// Library-level error type for launcher and installer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("mcp-cli not found. Please install it using: {}", tool::INSTALL_ENTRY_POINT)]
    NotFound,

    #[error("failed to start '{}': {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("mcp-cli did not finish within {}s and was terminated", .0.as_secs())]
    Timeout(Duration),

    #[error("invocation cancelled; mcp-cli was terminated")]
    Cancelled,

    #[error(
        "Python not found. Please install Python 3.11+ and try again.\n   Visit: {}",
        tool::PYTHON_DOWNLOAD_URL
    )]
    PythonNotFound,

    #[error(
        "failed to install mcp-cli with pip: {detail}\n   Please install manually:\n   pip install {}",
        tool::SOURCE_REF
    )]
    InstallationFailed { detail: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mcp-gearbox operations.
pub type Result<T> = std::result::Result<T, Error>;

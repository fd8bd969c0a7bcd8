//! Fixed names and argument lists shared by the resolver and the installer.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the user's home that holds the priority config.
pub const CONFIG_DIR_NAME: &str = ".mcpgearbox";

/// File name of the priority config.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Canonical executable name of the proxied tool.
pub const EXECUTABLE_NAME: &str = "mcp-cli";

/// Python module that implements the tool.
pub const MODULE_NAME: &str = "mcp_cli";

/// Interpreter flag that runs a module as a script.
pub const MODULE_FLAG: &str = "-m";

/// Interpreter commands tried in order.
pub const PYTHON_CANDIDATES: [&str; 3] = ["python3", "python", "py"];

/// Package manager tried first by the installer.
pub const UV_BINARY: &str = "uv";

/// Package name registered with `uv tool install`.
pub const PACKAGE_NAME: &str = "mcp-gearbox";

/// Source reference both package managers install from.
pub const SOURCE_REF: &str = "git+https://github.com/rohitsoni007/mcp-gearbox-cli";

/// Binary users run to install the tool.
pub const INSTALL_ENTRY_POINT: &str = "mcp-gearbox-install";

/// Where users are sent when no Python interpreter is found.
pub const PYTHON_DOWNLOAD_URL: &str = "https://www.python.org/downloads/";

/// Wall-clock limit for a single tool invocation.
pub const INVOCATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Time a terminated child gets to exit before it is killed.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Arguments for `uv` (force-reinstall from [`SOURCE_REF`]).
pub fn uv_install_args() -> Vec<String> {
    [
        "tool",
        "install",
        PACKAGE_NAME,
        "--force",
        "--from",
        SOURCE_REF,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Arguments for the interpreter when installing through pip.
pub fn pip_install_args() -> Vec<String> {
    [MODULE_FLAG, "pip", "install", SOURCE_REF]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Arguments that check whether an interpreter can import the tool module.
pub fn probe_args() -> Vec<String> {
    vec!["-c".to_string(), format!("import {}", MODULE_NAME)]
}

/// Prefix `args` with `-m mcp_cli`.
pub fn module_args(args: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len() + 2);
    out.push(MODULE_FLAG.to_string());
    out.push(MODULE_NAME.to_string());
    out.extend(args.iter().cloned());
    out
}

/// Where `uv tool install` places the executable.
///
/// - Unix: `~/.local/bin/mcp-cli`
/// - Windows: `%USERPROFILE%\.local\bin\mcp-cli.exe`
pub fn default_install_path(home: &Path) -> PathBuf {
    #[cfg(windows)]
    let binary_name = format!("{}.exe", EXECUTABLE_NAME);
    #[cfg(not(windows))]
    let binary_name = EXECUTABLE_NAME.to_string();

    home.join(".local").join("bin").join(binary_name)
}

/// Location of the priority config under `home`.
pub fn config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
}

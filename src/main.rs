//! `mcp` - forwards its arguments to `mcp-cli` and exits with its status.
//!
//! The command line is never parsed: every argument after `mcp`, `--`
//! included, belongs to `mcp-cli`. Launcher settings come from the
//! environment only.

use clap::Parser;
use mcp_gearbox::{CancelHandle, Error, InvocationRequest, Launcher, StdioMode, ToolArgs, logging};
use std::ffi::OsString;
use std::process;
use std::time::Duration;
use tracing::level_filters::LevelFilter;

const TIMEOUT_ENV_VAR: &str = "MCP_GEARBOX_TIMEOUT_SECS";

/// Exit status after Ctrl-C, matching a SIGINT death.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Launcher settings, read from the environment.
#[derive(Parser, Debug)]
#[command(
    name = "mcp",
    no_binary_name = true,
    disable_help_flag = true,
    disable_version_flag = true
)]
struct Settings {
    /// Seconds to wait for mcp-cli before terminating it (0 waits forever)
    #[arg(long, env = TIMEOUT_ENV_VAR, default_value_t = 30, hide = true)]
    timeout_secs: u64,
}

impl Settings {
    fn from_env() -> Result<Self, clap::Error> {
        Self::try_parse_from(std::iter::empty::<OsString>())
    }

    fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// The arguments to hand to `mcp-cli`, exactly as received.
fn forwarded_args(raw: impl IntoIterator<Item = OsString>) -> Result<Vec<String>, OsString> {
    raw.into_iter().map(OsString::into_string).collect()
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error executing mcp: {}", message);
    process::exit(1);
}

fn main() {
    logging::init(LevelFilter::WARN);

    let settings = Settings::from_env()
        .unwrap_or_else(|e| fail(format!("{} is not usable: {}", TIMEOUT_ENV_VAR, e.kind())));
    let args = forwarded_args(std::env::args_os().skip(1))
        .unwrap_or_else(|arg| fail(format!("argument {:?} is not valid UTF-8", arg)));

    let cancel = CancelHandle::new();
    let handler_cancel = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_cancel.cancel()) {
        tracing::debug!("could not install Ctrl-C handler: {}", e);
    }

    let request = InvocationRequest::new(ToolArgs::from(args))
        .stdio(StdioMode::Inherit)
        .timeout(settings.timeout())
        .cancel_on(cancel);

    match Launcher::system().execute(&request) {
        Ok(result) => process::exit(result.exit_code),
        Err(Error::Cancelled) => process::exit(INTERRUPTED_EXIT_CODE),
        Err(e) => fail(e),
    }
}

//! Stderr logging for both binaries.
//!
//! Output goes to stderr so the proxied tool's stdout stays untouched.
//! `MCP_GEARBOX_LOG` takes the usual `EnvFilter` syntax.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "MCP_GEARBOX_LOG";

fn env_filter(default_level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}

/// Install the global subscriber. Calling this twice is harmless.
pub fn init(default_level: LevelFilter) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

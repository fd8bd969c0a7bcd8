//! `mcp-gearbox-install` - installs mcp-cli with uv or pip and records how.

use clap::Parser;
use mcp_gearbox::{InstallMethod, Installer, logging};
use std::process;
use tracing::level_filters::LevelFilter;

#[derive(Parser, Debug)]
#[command(
    name = "mcp-gearbox-install",
    version,
    about = "Install mcp-cli using uv, or pip when uv is unavailable"
)]
struct Cli {}

fn main() {
    logging::init(LevelFilter::INFO);
    let _cli = Cli::parse();

    println!("Installing mcp-cli...");

    match Installer::system().install() {
        Ok(outcome) => {
            match outcome.method() {
                InstallMethod::Uv => println!("mcp-cli installed successfully with uv!"),
                InstallMethod::Pip => println!("mcp-cli installed successfully with pip!"),
            }
            if let Some(path) = &outcome.config_path {
                println!("Recorded install method in {}", path.display());
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

//! Installs `mcp-cli` with uv, falling back to pip.
//!
//! On success the chosen method is recorded in the priority config so the
//! resolver can skip discovery. Failing to record it is only a warning: the
//! tool is installed either way.

use crate::config::{ConfigStore, InstallMethod, PriorityConfig};
use crate::host::{Host, SystemHost};
use crate::tool;
use crate::{Error, Result};
use std::path::PathBuf;

/// What the installer did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    pub config: PriorityConfig,
    /// Where the config was written, or `None` if recording it failed.
    pub config_path: Option<PathBuf>,
}

impl InstallOutcome {
    pub fn method(&self) -> InstallMethod {
        self.config.install_method
    }
}

#[derive(Debug, Clone)]
pub struct Installer<H = SystemHost> {
    host: H,
    store: Option<ConfigStore>,
}

impl Installer<SystemHost> {
    pub fn system() -> Self {
        Self::new(SystemHost)
    }
}

impl<H: Host> Installer<H> {
    pub fn new(host: H) -> Self {
        Self { host, store: None }
    }

    pub fn with_config(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Try uv, then pip.
    ///
    /// # Errors
    /// - [`Error::PythonNotFound`] when uv did not succeed and no interpreter is on PATH
    /// - [`Error::InstallationFailed`] when pip fails to start or exits non-zero
    pub fn install(&self) -> Result<InstallOutcome> {
        if let Some(outcome) = self.install_with_uv() {
            return Ok(outcome);
        }
        self.install_with_pip()
    }

    fn install_with_uv(&self) -> Option<InstallOutcome> {
        let Some(uv) = self.host.which(tool::UV_BINARY) else {
            tracing::info!("uv not found, trying pip...");
            return None;
        };

        tracing::info!("Found uv, installing with uv tool...");
        match self.host.run(&uv, &tool::uv_install_args()) {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!("uv installation failed, trying pip...");
                return None;
            }
            Err(e) => {
                tracing::warn!("uv could not be started ({}), trying pip...", e);
                return None;
            }
        }

        let executable_path = match self.host.home_dir() {
            Some(home) => tool::default_install_path(&home)
                .to_string_lossy()
                .into_owned(),
            None => tool::EXECUTABLE_NAME.to_string(),
        };
        Some(self.record(PriorityConfig::new(InstallMethod::Uv, executable_path)))
    }

    fn install_with_pip(&self) -> Result<InstallOutcome> {
        let python = tool::PYTHON_CANDIDATES
            .iter()
            .find_map(|candidate| self.host.which(candidate))
            .ok_or(Error::PythonNotFound)?;

        tracing::info!("Found Python at: {}", python.display());
        tracing::info!("Installing mcp-cli with pip...");

        match self.host.run(&python, &tool::pip_install_args()) {
            Ok(true) => {
                let executable_path = format!(
                    "{} {} {}",
                    python.display(),
                    tool::MODULE_FLAG,
                    tool::MODULE_NAME
                );
                Ok(self.record(PriorityConfig::new(InstallMethod::Pip, executable_path)))
            }
            Ok(false) => Err(Error::InstallationFailed {
                detail: "pip exited with a non-zero status".to_string(),
            }),
            Err(e) => Err(Error::InstallationFailed {
                detail: format!("could not start {}: {}", python.display(), e),
            }),
        }
    }

    fn record(&self, config: PriorityConfig) -> InstallOutcome {
        let store = self
            .store
            .clone()
            .or_else(|| self.host.home_dir().map(|home| ConfigStore::in_home(&home)));

        let config_path = match store {
            Some(store) => match store.write(&config) {
                Ok(()) => Some(store.path().to_path_buf()),
                Err(e) => {
                    tracing::warn!(
                        "could not save install config to {}: {}",
                        store.path().display(),
                        e
                    );
                    None
                }
            },
            None => {
                tracing::warn!("could not determine home directory, install config not saved");
                None
            }
        };

        InstallOutcome {
            config,
            config_path,
        }
    }
}

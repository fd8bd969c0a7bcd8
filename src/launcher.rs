//! Resolve-then-spawn entry point used by the `mcp` binary and library callers.

use crate::config::ConfigStore;
use crate::exec::{self, InvocationRequest, InvocationResult, StdioMode};
use crate::host::{Host, SystemHost};
use crate::resolver::{Invocation, Resolver, ToolArgs};
use crate::Result;

#[derive(Debug, Clone)]
pub struct Launcher<H = SystemHost> {
    resolver: Resolver<H>,
}

impl Launcher<SystemHost> {
    pub fn system() -> Self {
        Self::new(SystemHost)
    }
}

impl<H: Host> Launcher<H> {
    pub fn new(host: H) -> Self {
        Self {
            resolver: Resolver::new(host),
        }
    }

    pub fn with_config(mut self, store: ConfigStore) -> Self {
        self.resolver = self.resolver.with_config(store);
        self
    }

    pub fn resolver(&self) -> &Resolver<H> {
        &self.resolver
    }

    /// Resolve the command for `request` without running it.
    pub fn resolve(&self, request: &InvocationRequest) -> Result<Invocation> {
        self.resolver.resolve(&request.args)
    }

    /// Resolve and run `mcp-cli` once.
    ///
    /// Resolution happens fresh on every call; nothing is cached between
    /// invocations.
    pub fn execute(&self, request: &InvocationRequest) -> Result<InvocationResult> {
        let invocation = self.resolve(request)?;
        exec::run(&invocation, request)
    }

    /// Whether `mcp-cli --version` can be resolved and exits 0.
    pub fn is_installed(&self) -> bool {
        let request = InvocationRequest::new(ToolArgs::from(["--version"])).stdio(StdioMode::Pipe);
        match self.execute(&request) {
            Ok(result) => result.success(),
            Err(e) => {
                tracing::debug!("mcp-cli is not usable: {}", e);
                false
            }
        }
    }
}

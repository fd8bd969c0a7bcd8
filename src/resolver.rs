//! Decides how to invoke `mcp-cli` in the current environment.
//!
//! # Resolution Flow
//!
//! ```text
//! resolve()
//!     ↓
//! 1. Config directive (~/.mcpgearbox/config.json)
//!     → uv:  recorded executable, must still exist
//!     → pip: recorded interpreter + `-m mcp_cli`, must still resolve
//!     ↓ (absent, unusable or stale)
//! 2. Default uv install location
//!     → ~/.local/bin/mcp-cli[.exe]
//!     ↓ (no file)
//! 3. Interpreter probe
//!     → python3, python, py on PATH
//!     → `<interp> -c "import mcp_cli"` must succeed
//!     ↓ (none usable)
//! 4. PATH lookup
//!     → mcp-cli, unless it is this launcher
//!     ↓ (not found)
//! 5. Error::NotFound
//! ```
//!
//! Steps are tried lazily: once one yields a command, later steps are never
//! consulted.

use crate::config::{ConfigStore, InstallMethod, PriorityConfig};
use crate::host::{Host, SystemHost};
use crate::tool;
use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Arguments forwarded to the tool.
///
/// A single string is split on spaces and blank pieces are dropped, so
/// `"list -a continue -j"` and `["list", "-a", "continue", "-j"]` produce the
/// same vector. Tabs and newlines stay inside their piece.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolArgs(Vec<String>);

impl ToolArgs {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ToolArgs {
    fn from(line: &str) -> Self {
        Self(
            line.split(' ')
                .filter(|piece| !piece.trim().is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

impl From<String> for ToolArgs {
    fn from(line: String) -> Self {
        Self::from(line.as_str())
    }
}

impl From<Vec<String>> for ToolArgs {
    fn from(args: Vec<String>) -> Self {
        Self(args)
    }
}

impl From<&[String]> for ToolArgs {
    fn from(args: &[String]) -> Self {
        Self(args.to_vec())
    }
}

impl From<Vec<&str>> for ToolArgs {
    fn from(args: Vec<&str>) -> Self {
        Self(args.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ToolArgs {
    fn from(args: [&str; N]) -> Self {
        Self(args.iter().map(|s| s.to_string()).collect())
    }
}

/// Which resolution step produced an [`Invocation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    ConfigDirective(InstallMethod),
    DefaultInstall,
    InterpreterModule,
    PathLookup,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::ConfigDirective(method) => write!(f, "config directive ({})", method),
            Source::DefaultInstall => write!(f, "default install location"),
            Source::InterpreterModule => write!(f, "interpreter module"),
            Source::PathLookup => write!(f, "system PATH"),
        }
    }
}

/// A concrete command ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub source: Source,
}

impl Invocation {
    fn direct(program: PathBuf, args: &[String], source: Source) -> Self {
        Self {
            program,
            args: args.to_vec(),
            source,
        }
    }

    fn module(interpreter: PathBuf, args: &[String], source: Source) -> Self {
        Self {
            program: interpreter,
            args: tool::module_args(args),
            source,
        }
    }
}

/// Runs the ordered discovery against a [`Host`].
#[derive(Debug, Clone)]
pub struct Resolver<H = SystemHost> {
    host: H,
    store: Option<ConfigStore>,
}

impl Resolver<SystemHost> {
    pub fn system() -> Self {
        Self::new(SystemHost)
    }
}

impl<H: Host> Resolver<H> {
    /// Resolver that reads the config under the host's home directory.
    pub fn new(host: H) -> Self {
        Self { host, store: None }
    }

    /// Use an explicit config location instead of the home directory.
    pub fn with_config(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Pick the command for `args`, or fail with [`Error::NotFound`].
    pub fn resolve(&self, args: &ToolArgs) -> Result<Invocation> {
        let args = args.as_slice();
        let home = self.host.home_dir();

        let invocation = self
            .config_directive(home.as_deref(), args)
            .or_else(|| self.default_install(home.as_deref(), args))
            .or_else(|| self.interpreter_module(args))
            .or_else(|| self.path_lookup(args))
            .ok_or(Error::NotFound)?;

        tracing::debug!(
            "resolved mcp-cli via {}: {}",
            invocation.source,
            invocation.program.display()
        );
        Ok(invocation)
    }

    fn config_directive(&self, home: Option<&Path>, args: &[String]) -> Option<Invocation> {
        let store = match (&self.store, home) {
            (Some(store), _) => store.clone(),
            (None, Some(home)) => ConfigStore::in_home(home),
            (None, None) => return None,
        };
        let config = store.read()?;

        match config.install_method {
            InstallMethod::Uv => {
                let program = PathBuf::from(config.executable_path.trim());
                if self.host.is_file(&program) {
                    Some(Invocation::direct(
                        program,
                        args,
                        Source::ConfigDirective(InstallMethod::Uv),
                    ))
                } else {
                    tracing::warn!(
                        "recorded uv install {} no longer exists, rediscovering",
                        program.display()
                    );
                    None
                }
            }
            InstallMethod::Pip => {
                let Some(interpreter) = self.recorded_interpreter(&config) else {
                    tracing::warn!(
                        "recorded pip interpreter '{}' is no longer available, rediscovering",
                        config.executable_path
                    );
                    return None;
                };
                Some(Invocation::module(
                    interpreter,
                    args,
                    Source::ConfigDirective(InstallMethod::Pip),
                ))
            }
        }
    }

    /// Re-verify the interpreter of a pip directive.
    ///
    /// Paths are checked on disk; bare command names go through PATH.
    fn recorded_interpreter(&self, config: &PriorityConfig) -> Option<PathBuf> {
        let interpreter = Path::new(config.interpreter()?);
        if interpreter.components().count() > 1 || interpreter.is_absolute() {
            self.host
                .is_file(interpreter)
                .then(|| interpreter.to_path_buf())
        } else {
            self.host.which(&interpreter.to_string_lossy())
        }
    }

    fn default_install(&self, home: Option<&Path>, args: &[String]) -> Option<Invocation> {
        let program = tool::default_install_path(home?);
        self.host
            .is_file(&program)
            .then(|| Invocation::direct(program, args, Source::DefaultInstall))
    }

    fn interpreter_module(&self, args: &[String]) -> Option<Invocation> {
        let probe = tool::probe_args();

        for candidate in tool::PYTHON_CANDIDATES {
            let Some(interpreter) = self.host.which(candidate) else {
                continue;
            };
            if self.host.probe(&interpreter, &probe) {
                return Some(Invocation::module(
                    interpreter,
                    args,
                    Source::InterpreterModule,
                ));
            }
            tracing::debug!(
                "{} cannot import {}, skipping",
                interpreter.display(),
                tool::MODULE_NAME
            );
        }
        None
    }

    fn path_lookup(&self, args: &[String]) -> Option<Invocation> {
        let program = self.host.which(tool::EXECUTABLE_NAME)?;
        if self.host.is_self(&program) {
            tracing::debug!(
                "{} on PATH is this launcher, skipping",
                program.display()
            );
            return None;
        }
        Some(Invocation::direct(program, args, Source::PathLookup))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(home: &Path, method: InstallMethod, executable_path: &str) {
        ConfigStore::in_home(home)
            .write(&PriorityConfig::new(method, executable_path))
            .unwrap();
    }

    fn args(line: &str) -> ToolArgs {
        ToolArgs::from(line)
    }

    // ========================================================================
    // ToolArgs
    // ========================================================================

    #[test]
    fn test_string_and_list_args_match() {
        let from_line = ToolArgs::from("list -a continue -j");
        let from_list = ToolArgs::from(vec![
            "list".to_string(),
            "-a".to_string(),
            "continue".to_string(),
            "-j".to_string(),
        ]);
        assert_eq!(from_line, from_list);
        assert_eq!(from_line, ToolArgs::from(["list", "-a", "continue", "-j"]));
    }

    #[test]
    fn test_string_args_drop_blank_segments() {
        let parsed = ToolArgs::from("  list   -j  ");
        assert_eq!(parsed.as_slice(), ["list", "-j"]);
        assert!(ToolArgs::from("   ").is_empty());
    }

    #[test]
    fn test_string_args_split_on_spaces_only() {
        let parsed = ToolArgs::from("add\tserver --name\nfoo");
        assert_eq!(parsed.as_slice(), ["add\tserver", "--name\nfoo"]);
        assert!(ToolArgs::from(" \t ").is_empty());
    }

    #[test]
    fn test_string_and_list_args_spawn_identically() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("python3", "/usr/bin/python3")
            .with_probe_ok("/usr/bin/python3");
        let resolver = Resolver::new(host);

        let a = resolver.resolve(&ToolArgs::from("list -a continue -j")).unwrap();
        let b = resolver
            .resolve(&ToolArgs::from(["list", "-a", "continue", "-j"]))
            .unwrap();
        assert_eq!(a.program, b.program);
        assert_eq!(a.args, b.args);
    }

    // ========================================================================
    // Step 1: config directive
    // ========================================================================

    #[test]
    fn test_pip_directive_splits_interpreter() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), InstallMethod::Pip, "/usr/bin/python3 -m mcp_cli");
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .with_file("/usr/bin/python3");

        let invocation = Resolver::new(host).resolve(&args("list -j")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/usr/bin/python3"));
        assert_eq!(invocation.args, vec!["-m", "mcp_cli", "list", "-j"]);
        assert_eq!(invocation.source, Source::ConfigDirective(InstallMethod::Pip));
    }

    #[test]
    fn test_uv_directive_passes_args_unmodified() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), InstallMethod::Uv, "/home/u/.local/bin/mcp-cli");
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .with_file("/home/u/.local/bin/mcp-cli");

        let invocation = Resolver::new(host)
            .resolve(&ToolArgs::from(["--version", "-x y"]))
            .unwrap();

        assert_eq!(invocation.program, PathBuf::from("/home/u/.local/bin/mcp-cli"));
        assert_eq!(invocation.args, vec!["--version", "-x y"]);
        assert_eq!(invocation.source, Source::ConfigDirective(InstallMethod::Uv));
    }

    #[test]
    fn test_pip_directive_with_bare_interpreter_uses_path() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), InstallMethod::Pip, "python3 -m mcp_cli");
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("python3", "/opt/py/bin/python3");

        let invocation = Resolver::new(host).resolve(&args("list")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/opt/py/bin/python3"));
        assert_eq!(invocation.source, Source::ConfigDirective(InstallMethod::Pip));
    }

    #[test]
    fn test_directive_wins_over_all_later_steps() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), InstallMethod::Uv, "/recorded/mcp-cli");
        let default_path = tool::default_install_path(temp_dir.path());
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .with_file("/recorded/mcp-cli")
            .with_file(&default_path)
            .on_path("python3", "/usr/bin/python3")
            .with_probe_ok("/usr/bin/python3")
            .on_path("mcp-cli", "/usr/bin/mcp-cli");
        let resolver = Resolver::new(host);

        let invocation = resolver.resolve(&args("list")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/recorded/mcp-cli"));
        let calls = resolver.host().calls();
        assert!(!calls.iter().any(|c| c.starts_with("which")));
        assert!(!calls.iter().any(|c| c.starts_with("probe")));
        assert!(
            !calls
                .iter()
                .any(|c| c == &format!("is_file {}", default_path.display()))
        );
    }

    #[test]
    fn test_stale_uv_directive_falls_through() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), InstallMethod::Uv, "/gone/mcp-cli");
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("mcp-cli", "/usr/local/bin/mcp-cli");

        let invocation = Resolver::new(host).resolve(&args("list")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/usr/local/bin/mcp-cli"));
        assert_eq!(invocation.source, Source::PathLookup);
    }

    #[test]
    fn test_stale_pip_directive_falls_through() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), InstallMethod::Pip, "/gone/python3 -m mcp_cli");
        let default_path = tool::default_install_path(temp_dir.path());
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .with_file(&default_path);

        let invocation = Resolver::new(host).resolve(&args("list")).unwrap();

        assert_eq!(invocation.program, default_path);
        assert_eq!(invocation.source, Source::DefaultInstall);
    }

    #[test]
    fn test_corrupted_config_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::in_home(temp_dir.path());
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{{{ garbage").unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("mcp-cli", "/usr/bin/mcp-cli");

        let invocation = Resolver::new(host).resolve(&args("list")).unwrap();

        assert_eq!(invocation.source, Source::PathLookup);
    }

    #[test]
    fn test_explicit_config_store_overrides_home() {
        let home = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let store = ConfigStore::new(elsewhere.path().join("custom.json"));
        store
            .write(&PriorityConfig::new(InstallMethod::Uv, "/custom/mcp-cli"))
            .unwrap();
        let host = FakeHost::new()
            .with_home(home.path())
            .with_file("/custom/mcp-cli");

        let invocation = Resolver::new(host)
            .with_config(store)
            .resolve(&args("list"))
            .unwrap();

        assert_eq!(invocation.program, PathBuf::from("/custom/mcp-cli"));
    }

    // ========================================================================
    // Step 2: default install location
    // ========================================================================

    #[test]
    fn test_default_install_location() {
        let temp_dir = TempDir::new().unwrap();
        let default_path = tool::default_install_path(temp_dir.path());
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .with_file(&default_path)
            .on_path("python3", "/usr/bin/python3")
            .with_probe_ok("/usr/bin/python3");
        let resolver = Resolver::new(host);

        let invocation = resolver.resolve(&args("list -j")).unwrap();

        assert_eq!(invocation.program, default_path);
        assert_eq!(invocation.args, vec!["list", "-j"]);
        assert_eq!(invocation.source, Source::DefaultInstall);
        assert!(!resolver.host().calls().iter().any(|c| c.starts_with("which")));
    }

    #[test]
    fn test_no_home_skips_config_and_default_install() {
        let host = FakeHost::new().on_path("mcp-cli", "/usr/bin/mcp-cli");

        let invocation = Resolver::new(host).resolve(&args("list")).unwrap();

        assert_eq!(invocation.source, Source::PathLookup);
    }

    // ========================================================================
    // Step 3: interpreter probe
    // ========================================================================

    #[test]
    fn test_python3_on_path_runs_module() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("python3", "/usr/bin/python3")
            .with_probe_ok("/usr/bin/python3")
            .on_path("mcp-cli", "/usr/bin/mcp-cli");
        let resolver = Resolver::new(host);

        let invocation = resolver.resolve(&args("list -a continue")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/usr/bin/python3"));
        assert_eq!(
            invocation.args,
            vec!["-m", "mcp_cli", "list", "-a", "continue"]
        );
        assert_eq!(invocation.source, Source::InterpreterModule);
        assert!(!resolver.host().calls().contains(&"which mcp-cli".to_string()));
    }

    #[test]
    fn test_probe_uses_import_check() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("python3", "/usr/bin/python3")
            .with_probe_ok("/usr/bin/python3");
        let resolver = Resolver::new(host);

        resolver.resolve(&args("list")).unwrap();

        assert!(
            resolver
                .host()
                .calls()
                .contains(&"probe /usr/bin/python3 -c import mcp_cli".to_string())
        );
    }

    #[test]
    fn test_interpreter_without_module_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("python3", "/usr/bin/python3")
            .on_path("python", "/usr/bin/python")
            .with_probe_ok("/usr/bin/python");

        let invocation = Resolver::new(host).resolve(&args("list")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/usr/bin/python"));
        assert_eq!(invocation.source, Source::InterpreterModule);
    }

    #[test]
    fn test_interpreter_candidates_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new().with_home(temp_dir.path());
        let resolver = Resolver::new(host);

        let _ = resolver.resolve(&args("list"));

        let whiches: Vec<String> = resolver
            .host()
            .calls()
            .into_iter()
            .filter(|c| c.starts_with("which"))
            .collect();
        assert_eq!(
            whiches,
            vec!["which python3", "which python", "which py", "which mcp-cli"]
        );
    }

    // ========================================================================
    // Step 4: PATH lookup
    // ========================================================================

    #[test]
    fn test_bare_path_lookup() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("mcp-cli", "/usr/local/bin/mcp-cli");

        let invocation = Resolver::new(host).resolve(&args("list -j")).unwrap();

        assert_eq!(invocation.program, PathBuf::from("/usr/local/bin/mcp-cli"));
        assert_eq!(invocation.args, vec!["list", "-j"]);
        assert_eq!(invocation.source, Source::PathLookup);
    }

    #[test]
    fn test_path_lookup_skips_own_binary() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new()
            .with_home(temp_dir.path())
            .on_path("mcp-cli", "/usr/local/bin/mcp-cli")
            .with_self_path("/usr/local/bin/mcp-cli");

        let err = Resolver::new(host).resolve(&args("list")).unwrap_err();

        assert!(matches!(err, Error::NotFound));
    }

    // ========================================================================
    // Step 5: NotFound
    // ========================================================================

    #[test]
    fn test_nothing_available_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let host = FakeHost::new().with_home(temp_dir.path());
        let resolver = Resolver::new(host);

        let err = resolver.resolve(&args("list")).unwrap_err();

        assert!(matches!(err, Error::NotFound));
        assert!(err.to_string().contains("mcp-gearbox-install"));
        assert!(
            !resolver
                .host()
                .calls()
                .iter()
                .any(|c| c.starts_with("run"))
        );
    }

    #[test]
    fn test_source_display() {
        assert_eq!(
            Source::ConfigDirective(InstallMethod::Pip).to_string(),
            "config directive (pip)"
        );
        assert_eq!(Source::PathLookup.to_string(), "system PATH");
    }
}

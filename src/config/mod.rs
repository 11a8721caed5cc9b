//! Configuration for mothdev
//!
//! Configuration is layered, later layers overriding earlier ones key by key:
//!
//! 1. Built-in defaults ([`DevConfig::default`])
//! 2. User config at `~/.config/mothdev/config.json` (platform config dir)
//! 3. The `--config` file, or `mothdev.json` in the current directory
//! 4. `MOTHDEV_*` environment variables (a `.env` file is loaded first by the binary)
//!
//! # Example mothdev.json
//!
//! ```json
//! {
//!   "bridge": { "kind": "mount" },
//!   "launch": { "installer": "calibre-customize.exe", "debugger": "calibre-debug.exe" },
//!   "check": { "linter": "pylama", "linter_args": ["--async"] }
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{DevError, Result};

/// Name of the per-project config file looked up in the current directory.
pub const PROJECT_CONFIG_FILE: &str = "mothdev.json";

/// Prefix shared by all environment overrides.
pub const ENV_PREFIX: &str = "MOTHDEV_";

/// Which path bridge translates POSIX paths for the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeKind {
    /// Run the `wslpath` utility.
    Wslpath,
    /// Built-in `/mnt/<drive>/...` <-> `<DRIVE>:\...` mapping.
    Mount,
    /// No translation; the host sees POSIX paths.
    Identity,
}

impl BridgeKind {
    /// Whether translated paths use Windows syntax.
    pub fn is_windows(self) -> bool {
        !matches!(self, BridgeKind::Identity)
    }
}

impl fmt::Display for BridgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BridgeKind::Wslpath => "wslpath",
            BridgeKind::Mount => "mount",
            BridgeKind::Identity => "identity",
        };
        f.write_str(name)
    }
}

impl FromStr for BridgeKind {
    type Err = DevError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "wslpath" | "wsl" => Ok(BridgeKind::Wslpath),
            "mount" => Ok(BridgeKind::Mount),
            "identity" | "none" => Ok(BridgeKind::Identity),
            other => Err(DevError::Config(format!(
                "unknown bridge kind '{}' (expected wslpath, mount or identity)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub kind: BridgeKind,
    /// Translator binary for [`BridgeKind::Wslpath`].
    pub program: String,
    pub timeout_secs: u64,
    /// Extend `WSLENV` so develop-from variables reach Windows processes.
    pub forward_wslenv: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            kind: BridgeKind::Wslpath,
            program: "wslpath".into(),
            timeout_secs: 10,
            forward_wslenv: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    pub installer: String,
    /// Arguments placed before the plugin directory.
    pub installer_args: Vec<String>,
    pub debugger: String,
    pub debugger_args: Vec<String>,
    /// Variable pointing the host at the development source tree.
    pub develop_env: String,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            installer: "calibre-customize".into(),
            installer_args: vec!["-b".into()],
            debugger: "calibre-debug".into(),
            debugger_args: vec!["-g".into()],
            develop_env: "CALIBRE_DEVELOP_FROM".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Stub cache directory, relative to the project directory.
    pub stub_dir: PathBuf,
    pub stub_generator: String,
    /// Library modules (packages) stubs are generated for.
    pub stub_modules: Vec<String>,
    pub linter: String,
    pub linter_args: Vec<String>,
    pub type_checker: String,
    pub type_checker_args: Vec<String>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            stub_dir: PathBuf::from(".mypy_stubs"),
            stub_generator: "stubgen".into(),
            stub_modules: vec!["calibre.ebooks.metadata".into(), "calibre.utils".into()],
            linter: "pylama".into(),
            linter_args: Vec::new(),
            type_checker: "mypy".into(),
            type_checker_args: Vec::new(),
        }
    }
}

/// Effective mothdev configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevConfig {
    /// Explicit project directory; discovered from the current directory when unset.
    pub project_dir: Option<PathBuf>,
    /// Plugin bundle, relative to the project directory.
    pub plugin_dir: PathBuf,
    /// Source tree handed to the linter and type checker.
    pub source_dir: PathBuf,
    /// Path components of the host's development tree under the project.
    pub develop_subdir: Vec<String>,
    pub bridge: BridgeConfig,
    pub launch: LaunchConfig,
    pub check: CheckConfig,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            project_dir: None,
            plugin_dir: PathBuf::from("calibre_plugins/moth"),
            source_dir: PathBuf::from("calibre_plugins"),
            develop_subdir: vec!["calibre".into(), "src".into()],
            bridge: BridgeConfig::default(),
            launch: LaunchConfig::default(),
            check: CheckConfig::default(),
        }
    }
}

impl DevConfig {
    /// User-level configuration directory.
    pub fn dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mothdev")
    }

    /// User-level configuration file.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load all layers from their standard locations and the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let project_file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => {
                let candidate = PathBuf::from(PROJECT_CONFIG_FILE);
                candidate.is_file().then_some(candidate)
            }
        };
        let user_file = Self::path();
        let user_file = user_file.is_file().then_some(user_file);

        let mut files = Vec::new();
        files.extend(user_file);
        files.extend(project_file);

        Self::load_layers(&files, |key| std::env::var(key).ok())
    }

    /// Merge the given JSON files over the defaults, then apply env overrides.
    ///
    /// Every listed file must exist; optional layers are filtered out by the caller.
    pub fn load_layers<F>(files: &[PathBuf], env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = serde_json::to_value(DevConfig::default())?;

        for file in files {
            if !file.is_file() {
                return Err(DevError::NotFound(format!(
                    "config file {}",
                    file.display()
                )));
            }
            let content = fs::read_to_string(file).map_err(|e| {
                DevError::Config(format!("Failed to read {}: {}", file.display(), e))
            })?;
            let layer: Value = serde_json::from_str(&content).map_err(|e| {
                DevError::Config(format!("Invalid JSON in {}: {}", file.display(), e))
            })?;
            debug!(file = %file.display(), "Merging config layer");
            merge_json(&mut merged, layer);
        }

        let mut config: DevConfig = serde_json::from_value(merged)
            .map_err(|e| DevError::Config(format!("Invalid configuration: {}", e)))?;
        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MOTHDEV_*` overrides. Empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            env(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.trim().is_empty())
        };

        if let Some(dir) = var("PROJECT_DIR") {
            self.project_dir = Some(PathBuf::from(dir));
        }
        if let Some(kind) = var("BRIDGE") {
            self.bridge.kind = kind.parse()?;
        }
        if let Some(program) = var("INSTALLER") {
            self.launch.installer = program;
        }
        if let Some(program) = var("DEBUGGER") {
            self.launch.debugger = program;
        }
        if let Some(dir) = var("STUB_DIR") {
            self.check.stub_dir = PathBuf::from(dir);
        }
        if let Some(program) = var("LINTER") {
            self.check.linter = program;
        }
        if let Some(program) = var("TYPE_CHECKER") {
            self.check.type_checker = program;
        }
        Ok(())
    }

    /// Reject values no workflow could run with.
    pub fn validate(&self) -> Result<()> {
        let programs = [
            ("bridge.program", &self.bridge.program),
            ("launch.installer", &self.launch.installer),
            ("launch.debugger", &self.launch.debugger),
            ("launch.develop_env", &self.launch.develop_env),
            ("check.stub_generator", &self.check.stub_generator),
            ("check.linter", &self.check.linter),
            ("check.type_checker", &self.check.type_checker),
        ];
        for (key, value) in programs {
            if value.trim().is_empty() {
                return Err(DevError::Config(format!("{} must not be empty", key)));
            }
        }
        if self.check.stub_modules.is_empty() {
            return Err(DevError::Config(
                "check.stub_modules must name at least one module".into(),
            ));
        }
        if self.bridge.timeout_secs == 0 {
            return Err(DevError::Config("bridge.timeout_secs must be positive".into()));
        }
        let stub_dir = &self.check.stub_dir;
        if stub_dir.as_os_str().is_empty() {
            return Err(DevError::Config("check.stub_dir must not be empty".into()));
        }
        // Removed recursively by --regenerate-stubs; must stay strictly inside the project.
        if !stub_dir
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(DevError::Config(format!(
                "check.stub_dir must be a relative path without '.' or '..' components, got {}",
                stub_dir.display()
            )));
        }
        Ok(())
    }
}

/// Deep-merge `overlay` into `base`: objects merge per key, anything else replaces.
fn merge_json(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_json(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

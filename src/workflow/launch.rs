//! Plugin dev-launcher.
//!
//! Registers the plugin bundle with calibre (`calibre-customize -b`) and, only
//! if that succeeds, starts the calibre debugger with the develop-from
//! variable pointing at `<project>\calibre\src` in the host's path syntax.

use tracing::{info, warn};

use crate::bridge::PathBridge;
use crate::config::DevConfig;
use crate::error::Result;
use crate::project::ProjectDir;
use crate::runner::{CommandSpec, ProcessRunner};

use super::{Sequence, Step};

/// Variable WSL reads to decide which variables cross into Windows processes.
pub const WSLENV: &str = "WSLENV";

#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    /// Stop after installing the plugin.
    pub no_debug: bool,
}

/// Commands the launcher will run, with derived paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    /// Project root in the host's native syntax.
    pub native_root: String,
    /// Value handed to the debugger through the develop-from variable.
    pub develop_from: String,
    pub sequence: Sequence,
}

/// Resolve paths and build the launch sequence without running it.
///
/// Path translation runs here; a bridge failure aborts before anything is
/// installed.
pub async fn plan_launch(
    config: &DevConfig,
    project: &ProjectDir,
    runner: &dyn ProcessRunner,
    options: LaunchOptions,
) -> Result<LaunchPlan> {
    let bridge = PathBridge::new(&config.bridge, runner);
    let native_root = bridge.to_native(project.root()).await?;
    let develop_from = bridge.join_native(&native_root, config.develop_subdir.as_slice());

    let plugin_dir = project.join(&config.plugin_dir);
    if !plugin_dir.is_dir() {
        warn!(dir = %plugin_dir.display(), "Plugin bundle directory does not exist");
    }

    let install = CommandSpec::new(config.launch.installer.as_str())
        .args(config.launch.installer_args.iter().cloned())
        .path_arg(&plugin_dir)
        .current_dir(project.root());
    let mut sequence = Sequence::new().then(Step::new("install plugin", install));

    if !options.no_debug {
        let mut debug = CommandSpec::new(config.launch.debugger.as_str())
            .args(config.launch.debugger_args.iter().cloned())
            .env(config.launch.develop_env.as_str(), develop_from.as_str())
            .current_dir(project.root());
        if bridge.kind().is_windows() && config.bridge.forward_wslenv {
            let existing = std::env::var(WSLENV).unwrap_or_default();
            debug = debug.env(WSLENV, forward_wslenv(&existing, &config.launch.develop_env));
        }
        sequence.push(Step::new("debug calibre", debug));
    }

    Ok(LaunchPlan {
        native_root,
        develop_from,
        sequence,
    })
}

/// Install the plugin, then launch the debugger.
pub async fn run_launch(
    config: &DevConfig,
    project: &ProjectDir,
    runner: &dyn ProcessRunner,
    options: LaunchOptions,
) -> Result<()> {
    let plan = plan_launch(config, project, runner, options).await?;
    info!(
        project = %project.root().display(),
        native = %plan.native_root,
        develop_from = %plan.develop_from,
        "Launching plugin development session"
    );
    plan.sequence.run(runner).await
}

/// Add `name` to a colon-separated `WSLENV` value unless already listed.
fn forward_wslenv(existing: &str, name: &str) -> String {
    let listed = existing
        .split(':')
        .any(|entry| entry.split('/').next() == Some(name));
    if listed {
        existing.to_string()
    } else if existing.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", existing, name)
    }
}

//! Launch and check command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};

use mothdev::config::DevConfig;
use mothdev::project::ProjectDir;
use mothdev::runner::{DryRunRunner, ProcessRunner, SystemRunner};
use mothdev::workflow::{run_check, run_launch, CheckOptions, LaunchOptions};

/// Options shared by every subcommand.
pub(crate) struct Globals {
    pub(crate) config: Option<PathBuf>,
    pub(crate) project_dir: Option<PathBuf>,
}

impl Globals {
    pub(crate) fn load_config(&self) -> Result<DevConfig> {
        DevConfig::load(self.config.as_deref()).with_context(|| "Failed to load configuration")
    }

    pub(crate) fn resolve_project(&self, config: &DevConfig) -> Result<ProjectDir> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        ProjectDir::resolve(self.project_dir.as_deref(), config, &cwd)
            .with_context(|| "Failed to resolve project directory")
    }
}

fn runner(dry_run: bool) -> Box<dyn ProcessRunner> {
    if dry_run {
        Box::new(DryRunRunner::new(SystemRunner::new()))
    } else {
        Box::new(SystemRunner::new())
    }
}

pub(crate) async fn cmd_launch(globals: &Globals, dry_run: bool, no_debug: bool) -> Result<()> {
    let config = globals.load_config()?;
    let project = globals.resolve_project(&config)?;
    let runner = runner(dry_run);

    if dry_run {
        eprintln!("[DRY RUN] Nothing will be installed or launched");
    }

    run_launch(&config, &project, runner.as_ref(), LaunchOptions { no_debug }).await?;
    Ok(())
}

pub(crate) async fn cmd_check(globals: &Globals, options: CheckOptions) -> Result<()> {
    let config = globals.load_config()?;
    let project = globals.resolve_project(&config)?;
    let runner = runner(options.dry_run);

    if options.dry_run {
        eprintln!("[DRY RUN] No checks will run");
    }

    run_check(&config, &project, runner.as_ref(), options).await?;
    Ok(())
}

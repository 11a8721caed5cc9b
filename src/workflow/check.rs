//! Static-check runner.
//!
//! Generates type stubs into the stub cache when it is missing, then runs the
//! linter and the type checker over the plugin sources. The cache is trusted
//! once present; it is only rebuilt on explicit request.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DevConfig;
use crate::error::{DevError, Result};
use crate::project::ProjectDir;
use crate::runner::{CommandSpec, ProcessRunner};

use super::{Sequence, Step};

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Delete the stub cache first so it is generated again.
    pub regenerate_stubs: bool,
    pub skip_lint: bool,
    pub skip_types: bool,
    /// Leave the filesystem untouched (no cache deletion).
    pub dry_run: bool,
}

/// Directory of generated stubs whose existence marks them as generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCache {
    dir: PathBuf,
}

impl StubCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn for_project(config: &DevConfig, project: &ProjectDir) -> Self {
        Self::new(project.join(&config.check.stub_dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Remove the cache so the next check regenerates it.
    ///
    /// Refuses any target that is not strictly inside the project root.
    pub fn clear(&self, project: &ProjectDir) -> Result<()> {
        if !self.dir.exists() {
            return Ok(());
        }
        let target = self.dir.canonicalize().map_err(|e| io_error(&self.dir, e))?;
        let root = project.root();
        if root.starts_with(&target) || !target.starts_with(root) {
            return Err(DevError::Config(format!(
                "refusing to remove stub cache {}: not a subdirectory of {}",
                target.display(),
                root.display()
            )));
        }
        fs::remove_dir_all(&self.dir).map_err(|e| io_error(&self.dir, e))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> DevError {
    DevError::Io(std::io::Error::new(
        e.kind(),
        format!("Failed to remove stub cache {}: {}", path.display(), e),
    ))
}

/// `MYPYPATH` for the type checker: the stub cache first, then any inherited entries.
fn mypy_path(stub_dir: &Path, inherited: Option<&OsStr>) -> Result<String> {
    let mut entries = vec![stub_dir.to_path_buf()];
    if let Some(existing) = inherited.filter(|v| !v.is_empty()) {
        entries.extend(std::env::split_paths(existing));
    }
    let joined = std::env::join_paths(entries).map_err(|e| {
        DevError::Config(format!("Cannot build MYPYPATH with {}: {}", stub_dir.display(), e))
    })?;
    Ok(joined.to_string_lossy().into_owned())
}

/// Build the check sequence for the current state of the stub cache.
pub fn plan_check(
    config: &DevConfig,
    project: &ProjectDir,
    cache: &StubCache,
    options: CheckOptions,
) -> Result<Sequence> {
    let mut sequence = Sequence::new();
    let check = &config.check;
    let source_dir = config.source_dir.to_string_lossy().into_owned();

    let cache_present = cache.exists() && !options.regenerate_stubs;
    if cache_present {
        info!(dir = %cache.dir().display(), "Stub cache present, skipping generation");
    } else {
        let mut generate = CommandSpec::new(check.stub_generator.as_str())
            .arg("-o")
            .path_arg(cache.dir())
            .arg("--search-path")
            .path_arg(&project.join(develop_path(config)));
        for module in &check.stub_modules {
            generate = generate.arg("-p").arg(module.as_str());
        }
        sequence.push(Step::new(
            "generate stubs",
            generate.current_dir(project.root()),
        ));
    }

    if !options.skip_lint {
        let lint = CommandSpec::new(check.linter.as_str())
            .args(check.linter_args.iter().cloned())
            .arg(source_dir.as_str())
            .current_dir(project.root());
        sequence.push(Step::new("lint", lint));
    }

    if !options.skip_types {
        let inherited = std::env::var_os("MYPYPATH");
        let types = CommandSpec::new(check.type_checker.as_str())
            .args(check.type_checker_args.iter().cloned())
            .arg(source_dir.as_str())
            .env("MYPYPATH", mypy_path(cache.dir(), inherited.as_deref())?)
            .current_dir(project.root());
        sequence.push(Step::new("type check", types));
    }

    Ok(sequence)
}

/// Generate stubs if needed, then lint and type-check. First failure wins.
pub async fn run_check(
    config: &DevConfig,
    project: &ProjectDir,
    runner: &dyn ProcessRunner,
    options: CheckOptions,
) -> Result<()> {
    let cache = StubCache::for_project(config, project);
    if options.regenerate_stubs && !options.dry_run {
        info!(dir = %cache.dir().display(), "Clearing stub cache");
        cache.clear(project)?;
    }

    let sequence = plan_check(config, project, &cache, options)?;
    sequence.run(runner).await
}

fn develop_path(config: &DevConfig) -> PathBuf {
    config.develop_subdir.iter().collect()
}

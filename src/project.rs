//! Project directory resolution.
//!
//! Every workflow starts by pinning down the project root as an absolute,
//! symlink-resolved path. All other paths (plugin bundle, stub cache, source
//! tree) are derived from it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::DevConfig;
use crate::error::{DevError, Result};

/// A resolved, canonical project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDir {
    root: PathBuf,
}

impl ProjectDir {
    /// Canonicalize `path` into a project root. The directory must exist.
    pub fn at(path: &Path) -> Result<Self> {
        let root = path.canonicalize().map_err(|e| {
            DevError::NotFound(format!("project directory {}: {}", path.display(), e))
        })?;
        if !root.is_dir() {
            return Err(DevError::Config(format!(
                "project path {} is not a directory",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    /// Resolve the project root for this invocation.
    ///
    /// Order: explicit `flag`, `config.project_dir`, the nearest ancestor of
    /// `cwd` that contains the plugin bundle, then `cwd` itself.
    pub fn resolve(flag: Option<&Path>, config: &DevConfig, cwd: &Path) -> Result<Self> {
        if let Some(dir) = flag.or(config.project_dir.as_deref()) {
            let dir = if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                cwd.join(dir)
            };
            debug!(dir = %dir.display(), "Using configured project directory");
            return Self::at(&dir);
        }

        match find_ancestor_with(cwd, &config.plugin_dir) {
            Some(dir) => {
                debug!(dir = %dir.display(), "Discovered project directory");
                Self::at(&dir)
            }
            None => {
                debug!(dir = %cwd.display(), "No plugin bundle above cwd, using cwd");
                Self::at(cwd)
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a project-relative path. Absolute paths pass through.
    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }
}

/// Walk from `start` upwards looking for a directory containing `marker`.
fn find_ancestor_with(start: &Path, marker: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

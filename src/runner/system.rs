//! Runners that actually touch the OS.
//!
//! [`SystemRunner`] spawns children via `tokio::process::Command`.
//! [`DryRunRunner`] prints what would run instead, but still delegates
//! captured commands so derived values (bridged paths) are real.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DevError, Result};

use super::types::{exit_code_of, CommandOutput, CommandSpec, ProcessRunner};

/// Spawns real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(spec: &CommandSpec) -> Command {
        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(spec: &CommandSpec, source: std::io::Error) -> DevError {
        DevError::Spawn {
            program: spec.program.clone(),
            source,
        }
    }
}

#[async_trait]
impl ProcessRunner for SystemRunner {
    async fn status(&self, spec: &CommandSpec) -> Result<i32> {
        debug!(command = %spec.display(), cwd = ?spec.cwd, "Running command");

        let status = Self::command(spec)
            .status()
            .await
            .map_err(|e| Self::spawn_error(spec, e))?;

        let code = exit_code_of(status);
        debug!(program = %spec.program, code, "Command finished");
        Ok(code)
    }

    async fn capture(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput> {
        debug!(command = %spec.display(), "Capturing command output");

        let mut cmd = Self::command(spec);
        cmd.kill_on_drop(true);

        let output = tokio::time::timeout(timeout, cmd.output())
            .await
            .map_err(|_| {
                Self::spawn_error(
                    spec,
                    std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        format!("timed out after {:?}", timeout),
                    ),
                )
            })?
            .map_err(|e| Self::spawn_error(spec, e))?;

        Ok(CommandOutput {
            code: exit_code_of(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Prints inherited-stdio commands instead of running them.
#[derive(Debug, Clone, Default)]
pub struct DryRunRunner<R> {
    inner: R,
}

impl<R: ProcessRunner> DryRunRunner<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<R: ProcessRunner> ProcessRunner for DryRunRunner<R> {
    async fn status(&self, spec: &CommandSpec) -> Result<i32> {
        match &spec.cwd {
            Some(dir) => println!("[dry-run] (cd {}) {}", dir.display(), spec.display()),
            None => println!("[dry-run] {}", spec.display()),
        }
        Ok(0)
    }

    async fn capture(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput> {
        self.inner.capture(spec, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::types::MockProcessRunner;

    #[tokio::test]
    async fn test_dry_run_never_spawns_status_commands() {
        let mut inner = MockProcessRunner::new();
        inner.expect_status().never();
        let runner = DryRunRunner::new(inner);

        let code = runner
            .status(&CommandSpec::new("calibre-customize").arg("-b"))
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn test_dry_run_delegates_capture() {
        let mut inner = MockProcessRunner::new();
        inner
            .expect_capture()
            .withf(|spec, _| spec.program == "wslpath")
            .times(1)
            .returning(|_, _| {
                Ok(CommandOutput {
                    code: 0,
                    stdout: "C:\\dev\n".into(),
                    stderr: String::new(),
                })
            });
        let runner = DryRunRunner::new(inner);

        let out = runner
            .capture(
                &CommandSpec::new("wslpath").args(["-w", "/mnt/c/dev"]),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(out.stdout, "C:\\dev\n");
    }

    #[tokio::test]
    async fn test_system_runner_missing_program() {
        let runner = SystemRunner::new();
        let err = runner
            .status(&CommandSpec::new("mothdev-definitely-not-installed-xyz"))
            .await
            .unwrap_err();
        assert!(matches!(err, DevError::Spawn { .. }));
    }
}

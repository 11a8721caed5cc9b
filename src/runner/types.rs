//! Command description and runner trait.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

/// One external program invocation.
///
/// A `CommandSpec` is inert: building one spawns nothing. Workflows build specs
/// and hand them to a [`ProcessRunner`], which keeps them loggable and lets
/// tests assert on exactly what would have been run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program name or path, resolved against `PATH` by the OS.
    pub program: String,
    /// Arguments, passed verbatim (no shell involved).
    pub args: Vec<String>,
    /// Extra environment for this child only, applied over the inherited one.
    pub env: Vec<(String, String)>,
    /// Working directory; `None` inherits ours.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a path argument, converted lossily to UTF-8.
    pub fn path_arg(self, path: &Path) -> Self {
        let arg = path.to_string_lossy().into_owned();
        self.arg(arg)
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Value of an environment override set on this spec, if any.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Render as a copy-pasteable shell line for logs and dry runs.
    pub fn display(&self) -> String {
        let mut parts: Vec<String> = self
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, shell_quote(v)))
            .collect();
        parts.push(shell_quote(&self.program));
        parts.extend(self.args.iter().map(|a| shell_quote(a)));
        parts.join(" ")
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Map an exit status to a shell-style exit code.
///
/// Signals become `128 + signal` on Unix, matching what a shell reports.
pub fn exit_code_of(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Executes [`CommandSpec`]s.
///
/// Implementations must block (await) until the child has exited; workflows
/// rely on this to order their steps.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run with inherited stdio and return the exit code.
    ///
    /// A child that ran and failed is `Ok` with a non-zero code; `Err` means
    /// the child could not be started.
    async fn status(&self, spec: &CommandSpec) -> Result<i32>;

    /// Run with captured stdout/stderr, giving up after `timeout`.
    async fn capture(&self, spec: &CommandSpec, timeout: Duration) -> Result<CommandOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_parts() {
        let spec = CommandSpec::new("calibre-debug")
            .arg("-g")
            .env("CALIBRE_DEVELOP_FROM", r"C:\dev\calibre\src")
            .current_dir("/work");
        assert_eq!(spec.program, "calibre-debug");
        assert_eq!(spec.args, vec!["-g"]);
        assert_eq!(
            spec.env_value("CALIBRE_DEVELOP_FROM"),
            Some(r"C:\dev\calibre\src")
        );
        assert_eq!(spec.cwd, Some(PathBuf::from("/work")));
    }

    #[test]
    fn test_env_value_last_wins() {
        let spec = CommandSpec::new("mypy")
            .env("MYPYPATH", "a")
            .env("MYPYPATH", "b");
        assert_eq!(spec.env_value("MYPYPATH"), Some("b"));
        assert_eq!(spec.env_value("MISSING"), None);
    }

    #[test]
    fn test_display_plain() {
        let spec = CommandSpec::new("pylama").arg("calibre_plugins");
        assert_eq!(spec.display(), "pylama calibre_plugins");
    }

    #[test]
    fn test_display_quotes_backslashes_and_spaces() {
        let spec = CommandSpec::new("calibre-debug")
            .arg("-g")
            .env("CALIBRE_DEVELOP_FROM", r"C:\My Files\src");
        assert_eq!(
            spec.display(),
            r"CALIBRE_DEVELOP_FROM='C:\My Files\src' calibre-debug -g"
        );
    }

    #[test]
    fn test_display_escapes_single_quote() {
        let spec = CommandSpec::new("echo").arg("it's");
        assert_eq!(spec.display(), r"echo 'it'\''s'");
    }

    #[test]
    fn test_display_empty_arg() {
        let spec = CommandSpec::new("echo").arg("");
        assert_eq!(spec.display(), "echo ''");
    }

    #[test]
    fn test_output_success() {
        let ok = CommandOutput {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(ok.success());
        let failed = CommandOutput { code: 3, ..ok };
        assert!(!failed.success());
    }
}

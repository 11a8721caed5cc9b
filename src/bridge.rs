//! POSIX <-> native path translation for Windows-hosted companion processes.
//!
//! When calibre runs on Windows and is driven from WSL, every path handed to
//! it (directly or through an environment variable) must be in Windows syntax.
//! Three bridges are available:
//!
//! - **wslpath**: delegate to the `wslpath` utility (`-w` / `-u`)
//! - **mount**: built-in mapping of `/mnt/<drive>/...` to `<DRIVE>:\...`, and of
//!   other absolute paths to `\\wsl$\<distro>\...` when the distro is known
//! - **identity**: paths pass through unchanged

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use tracing::debug;

use crate::config::{BridgeConfig, BridgeKind};
use crate::error::{DevError, Result};
use crate::runner::{CommandSpec, ProcessRunner};

/// Translates paths according to the configured [`BridgeKind`].
pub struct PathBridge<'a> {
    kind: BridgeKind,
    program: String,
    timeout: Duration,
    distro: Option<String>,
    runner: &'a dyn ProcessRunner,
}

impl<'a> PathBridge<'a> {
    pub fn new(config: &BridgeConfig, runner: &'a dyn ProcessRunner) -> Self {
        Self {
            kind: config.kind,
            program: config.program.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            distro: std::env::var("WSL_DISTRO_NAME")
                .ok()
                .filter(|d| !d.is_empty()),
            runner,
        }
    }

    /// Override the WSL distribution used for non-`/mnt` paths by the mount bridge.
    pub fn with_distro(mut self, distro: Option<String>) -> Self {
        self.distro = distro;
        self
    }

    pub fn kind(&self) -> BridgeKind {
        self.kind
    }

    /// Separator of the native path syntax.
    pub fn separator(&self) -> char {
        if self.kind.is_windows() {
            '\\'
        } else {
            '/'
        }
    }

    /// Translate a POSIX path to native syntax.
    pub async fn to_native(&self, path: &Path) -> Result<String> {
        let posix = path.to_string_lossy();
        let native = match self.kind {
            BridgeKind::Identity => posix.into_owned(),
            BridgeKind::Mount => posix_to_windows(&posix, self.distro.as_deref())?,
            BridgeKind::Wslpath => self.run_wslpath("-w", &posix).await?,
        };
        debug!(posix = %path.display(), native = %native, bridge = %self.kind, "Translated path");
        Ok(native)
    }

    /// Translate a native path back to POSIX syntax.
    pub async fn to_posix(&self, native: &str) -> Result<PathBuf> {
        let posix = match self.kind {
            BridgeKind::Identity => native.to_string(),
            BridgeKind::Mount => windows_to_posix(native)?,
            BridgeKind::Wslpath => self.run_wslpath("-u", native).await?,
        };
        Ok(PathBuf::from(posix))
    }

    /// Append components to a native path using the native separator.
    pub fn join_native<S: AsRef<str>>(&self, base: &str, components: &[S]) -> String {
        let sep = self.separator();
        let mut joined = base.trim_end_matches(sep).to_string();
        for component in components {
            joined.push(sep);
            joined.push_str(component.as_ref());
        }
        joined
    }

    async fn run_wslpath(&self, flag: &str, path: &str) -> Result<String> {
        let spec = CommandSpec::new(self.program.as_str()).arg(flag).arg(path);
        let output = self
            .runner
            .capture(&spec, self.timeout)
            .await
            .map_err(|e| DevError::Bridge(e.to_string()))?;

        if !output.success() {
            return Err(DevError::Bridge(format!(
                "{} {} {} failed (code {}): {}",
                self.program,
                flag,
                path,
                output.code,
                output.stderr.trim()
            )));
        }

        let translated = output.stdout.trim_end_matches(['\r', '\n']).to_string();
        if translated.is_empty() {
            return Err(DevError::Bridge(format!(
                "{} returned no path for {}",
                self.program, path
            )));
        }
        Ok(translated)
    }
}

fn regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| DevError::Bridge(format!("bad pattern: {}", e)))
}

/// Map a POSIX path to Windows syntax the way WSL mounts drives.
///
/// `/mnt/c/Users/me` becomes `C:\Users\me`. Other absolute paths become
/// `\\wsl$\<distro>\...` when a distro is given.
pub fn posix_to_windows(path: &str, distro: Option<&str>) -> Result<String> {
    if !path.starts_with('/') {
        return Err(DevError::Bridge(format!(
            "cannot translate relative path {}",
            path
        )));
    }

    let drive = regex(r"^/mnt/([A-Za-z])(/.*)?$")?;
    if let Some(caps) = drive.captures(path) {
        let letter = caps[1].to_ascii_uppercase();
        let rest = caps
            .get(2)
            .map(|m| m.as_str().trim_end_matches('/'))
            .unwrap_or("");
        return Ok(format!("{}:\\{}", letter, rest.trim_start_matches('/').replace('/', "\\")));
    }

    match distro {
        Some(distro) => Ok(format!(
            "\\\\wsl$\\{}{}",
            distro,
            path.trim_end_matches('/').replace('/', "\\")
        )),
        None => Err(DevError::Bridge(format!(
            "{} is not under /mnt/<drive> and no WSL distro is known",
            path
        ))),
    }
}

/// Inverse of [`posix_to_windows`].
pub fn windows_to_posix(path: &str) -> Result<String> {
    let drive = regex(r"^([A-Za-z]):(?:[\\/](.*))?$")?;
    if let Some(caps) = drive.captures(path) {
        let letter = caps[1].to_ascii_lowercase();
        let rest = caps
            .get(2)
            .map(|m| m.as_str().replace('\\', "/"))
            .unwrap_or_default();
        let rest = rest.trim_end_matches('/');
        return Ok(if rest.is_empty() {
            format!("/mnt/{}", letter)
        } else {
            format!("/mnt/{}/{}", letter, rest)
        });
    }

    let unc = regex(r"^\\\\wsl(?:\$|\.localhost)\\[^\\]+(\\.*)?$")?;
    if let Some(caps) = unc.captures(path) {
        let rest = caps
            .get(1)
            .map(|m| m.as_str().replace('\\', "/"))
            .unwrap_or_default();
        let rest = rest.trim_end_matches('/');
        return Ok(if rest.is_empty() {
            "/".to_string()
        } else {
            rest.to_string()
        });
    }

    Err(DevError::Bridge(format!(
        "{} is neither a drive path nor a WSL share path",
        path
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::testing::ScriptedRunner;
    use crate::runner::types::MockProcessRunner;
    use crate::runner::CommandOutput;

    fn config(kind: BridgeKind) -> BridgeConfig {
        BridgeConfig {
            kind,
            ..BridgeConfig::default()
        }
    }

    #[test]
    fn test_posix_to_windows_drive() {
        assert_eq!(
            posix_to_windows("/mnt/c/Users/me/moth", None).unwrap(),
            r"C:\Users\me\moth"
        );
        assert_eq!(posix_to_windows("/mnt/d", None).unwrap(), r"D:\");
        assert_eq!(posix_to_windows("/mnt/e/", None).unwrap(), r"E:\");
    }

    #[test]
    fn test_posix_to_windows_distro_share() {
        assert_eq!(
            posix_to_windows("/home/me/moth", Some("Ubuntu")).unwrap(),
            r"\\wsl$\Ubuntu\home\me\moth"
        );
    }

    #[test]
    fn test_posix_to_windows_needs_distro_outside_mnt() {
        assert!(posix_to_windows("/home/me", None).is_err());
        // "/mnt/cd" is not a drive mount
        assert!(posix_to_windows("/mnt/cd/x", None).is_err());
    }

    #[test]
    fn test_posix_to_windows_rejects_relative() {
        assert!(posix_to_windows("moth/src", Some("Ubuntu")).is_err());
    }

    #[test]
    fn test_windows_to_posix() {
        assert_eq!(
            windows_to_posix(r"C:\Users\me\moth").unwrap(),
            "/mnt/c/Users/me/moth"
        );
        assert_eq!(windows_to_posix(r"D:\").unwrap(), "/mnt/d");
        assert_eq!(windows_to_posix("D:").unwrap(), "/mnt/d");
        assert_eq!(
            windows_to_posix(r"\\wsl.localhost\Ubuntu\home\me").unwrap(),
            "/home/me"
        );
        assert_eq!(windows_to_posix(r"\\wsl$\Ubuntu").unwrap(), "/");
        assert!(windows_to_posix("relative\\path").is_err());
    }

    #[test]
    fn test_mount_bridge_is_lossless_for_ascii_paths() {
        let paths = [
            "/mnt/c/dev/moth",
            "/mnt/z/a/b/c/d",
            "/mnt/c",
            "/home/user/projects/moth",
            "/",
        ];
        for path in paths {
            let native = posix_to_windows(path, Some("Debian")).unwrap();
            let back = windows_to_posix(&native).unwrap();
            assert_eq!(back, path, "round trip through {}", native);
        }
    }

    #[tokio::test]
    async fn test_identity_bridge() {
        let runner = ScriptedRunner::new();
        let bridge = PathBridge::new(&config(BridgeKind::Identity), &runner);
        let native = bridge.to_native(Path::new("/home/me/moth")).await.unwrap();
        assert_eq!(native, "/home/me/moth");
        assert_eq!(
            bridge.to_posix(&native).await.unwrap(),
            PathBuf::from("/home/me/moth")
        );
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_wslpath_bridge_invokes_utility() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_capture()
            .withf(|spec, timeout| {
                spec.program == "wslpath"
                    && spec.args == vec!["-w".to_string(), "/home/me/moth".to_string()]
                    && *timeout == Duration::from_secs(10)
            })
            .times(1)
            .returning(|_, _| {
                Ok(CommandOutput {
                    code: 0,
                    stdout: "\\\\wsl.localhost\\Ubuntu\\home\\me\\moth\r\n".into(),
                    stderr: String::new(),
                })
            });
        let bridge = PathBridge::new(&config(BridgeKind::Wslpath), &runner);

        let native = bridge.to_native(Path::new("/home/me/moth")).await.unwrap();
        assert_eq!(native, r"\\wsl.localhost\Ubuntu\home\me\moth");
    }

    #[tokio::test]
    async fn test_wslpath_failure_is_bridge_error() {
        let runner = ScriptedRunner::new().exit_with("wslpath", 1);
        let bridge = PathBridge::new(&config(BridgeKind::Wslpath), &runner);
        let err = bridge.to_native(Path::new("/home/me")).await.unwrap_err();
        assert!(matches!(err, DevError::Bridge(_)));
    }

    #[tokio::test]
    async fn test_wslpath_empty_output_is_bridge_error() {
        let runner = ScriptedRunner::new().print("wslpath", "\n");
        let bridge = PathBridge::new(&config(BridgeKind::Wslpath), &runner);
        assert!(bridge.to_native(Path::new("/home/me")).await.is_err());
    }

    #[tokio::test]
    async fn test_wslpath_round_trip() {
        let runner = ScriptedRunner::new();
        let bridge = PathBridge::new(&config(BridgeKind::Wslpath), &runner);
        let native = bridge.to_native(Path::new("/home/me/moth")).await.unwrap();
        let back = bridge.to_posix(&native).await.unwrap();
        assert_eq!(back, PathBuf::from("/home/me/moth"));

        let calls = runner.calls();
        assert_eq!(calls[0].args[0], "-w");
        assert_eq!(calls[1].args[0], "-u");
    }

    #[tokio::test]
    async fn test_mount_bridge_uses_distro() {
        let runner = ScriptedRunner::new();
        let bridge = PathBridge::new(&config(BridgeKind::Mount), &runner)
            .with_distro(Some("Ubuntu".into()));
        let native = bridge.to_native(Path::new("/srv/moth")).await.unwrap();
        assert_eq!(native, r"\\wsl$\Ubuntu\srv\moth");
    }

    #[test]
    fn test_join_native() {
        let runner = ScriptedRunner::new();
        let windows = PathBridge::new(&config(BridgeKind::Mount), &runner);
        assert_eq!(
            windows.join_native(r"C:\dev\moth", &["calibre", "src"]),
            r"C:\dev\moth\calibre\src"
        );
        assert_eq!(windows.join_native(r"C:\", &["src"]), r"C:\src");

        let identity = PathBridge::new(&config(BridgeKind::Identity), &runner);
        assert_eq!(
            identity.join_native("/home/me/moth", &["calibre", "src"]),
            "/home/me/moth/calibre/src"
        );
    }
}

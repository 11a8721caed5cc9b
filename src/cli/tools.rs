//! Bridge and config inspection commands.

use std::path::Path;

use anyhow::{Context, Result};

use mothdev::bridge::PathBridge;
use mothdev::runner::SystemRunner;

use super::workflow::Globals;

pub(crate) async fn cmd_bridge(globals: &Globals, path: &str, reverse: bool) -> Result<()> {
    let config = globals.load_config()?;
    let runner = SystemRunner::new();
    let bridge = PathBridge::new(&config.bridge, &runner);

    if reverse {
        let posix = bridge
            .to_posix(path)
            .await
            .with_context(|| format!("Failed to translate {}", path))?;
        println!("{}", posix.display());
    } else {
        let posix = Path::new(path);
        let absolute = if posix.is_absolute() {
            posix.to_path_buf()
        } else {
            std::env::current_dir()
                .context("Failed to read current directory")?
                .join(posix)
        };
        let native = bridge
            .to_native(&absolute)
            .await
            .with_context(|| format!("Failed to translate {}", absolute.display()))?;
        println!("{}", native);
    }
    Ok(())
}

pub(crate) fn cmd_config(globals: &Globals) -> Result<()> {
    let config = globals.load_config()?;
    let json = serde_json::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", json);
    Ok(())
}

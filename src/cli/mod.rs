//! Command-line surface of the mothdev binary.

mod tools;
mod workflow;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "mothdev")]
#[command(about = "Developer workflow launcher for the moth calibre plugin", long_about = None)]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub(crate) verbose: u8,

    /// Config file to use instead of ./mothdev.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Project root (default: nearest ancestor containing the plugin bundle)
    #[arg(long, global = true)]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the plugin into calibre and start the calibre debugger
    Launch {
        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
        /// Install the plugin only
        #[arg(long)]
        no_debug: bool,
    },
    /// Generate type stubs if missing, then lint and type-check the plugin
    Check {
        /// Print the commands instead of running them
        #[arg(long)]
        dry_run: bool,
        /// Delete the stub cache and generate it again
        #[arg(long)]
        regenerate_stubs: bool,
        /// Do not run the linter
        #[arg(long)]
        skip_lint: bool,
        /// Do not run the type checker
        #[arg(long)]
        skip_types: bool,
    },
    /// Translate a path with the configured path bridge
    Bridge {
        path: String,
        /// Translate a native path back to POSIX syntax
        #[arg(long)]
        reverse: bool,
    },
    /// Print the effective configuration as JSON
    Config,
    /// Show version information
    Version,
}

pub(crate) async fn run(cli: Cli) -> Result<()> {
    let globals = workflow::Globals {
        config: cli.config,
        project_dir: cli.project_dir,
    };

    match cli.command {
        Commands::Launch { dry_run, no_debug } => {
            workflow::cmd_launch(&globals, dry_run, no_debug).await
        }
        Commands::Check {
            dry_run,
            regenerate_stubs,
            skip_lint,
            skip_types,
        } => {
            let options = mothdev::workflow::CheckOptions {
                regenerate_stubs,
                skip_lint,
                skip_types,
                dry_run,
            };
            workflow::cmd_check(&globals, options).await
        }
        Commands::Bridge { path, reverse } => tools::cmd_bridge(&globals, &path, reverse).await,
        Commands::Config => tools::cmd_config(&globals),
        Commands::Version => {
            println!("mothdev {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

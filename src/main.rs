mod cli;

use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use mothdev::error::{DevError, INTERNAL_EXIT_CODE};

#[tokio::main]
async fn main() {
    // .env feeds MOTHDEV_* overrides and RUST_LOG; reported once logging is up
    let dotenv_error = dotenvy::dotenv().err().filter(|e| !e.not_found());

    let cli = cli::Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(err) = dotenv_error {
        warn!(error = %err, "Ignoring unreadable .env file");
    }

    if let Err(err) = cli::run(cli).await {
        let code = match err.downcast_ref::<DevError>() {
            // The tool already reported its own diagnostics.
            Some(dev @ DevError::CommandFailed { .. }) => {
                debug!(error = %dev, "Workflow stopped");
                dev.exit_code()
            }
            Some(dev) => {
                eprintln!("Error: {:#}", err);
                dev.exit_code()
            }
            None => {
                eprintln!("Error: {:#}", err);
                INTERNAL_EXIT_CODE
            }
        };
        std::process::exit(code);
    }
}

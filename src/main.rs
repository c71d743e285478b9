//! Entry point of the `overlay-updater` binary.
//!
//! Parses the command line, runs one update and exits with the code the run
//! produced. Startup errors are printed through
//! [`user_friendly_error`](overlay_updater::core::user_friendly_error).

use anyhow::Result;
use clap::Parser;
use overlay_updater::cli;
use overlay_updater::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(0) => Ok(()),
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

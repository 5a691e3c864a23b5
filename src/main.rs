//! Skeleton installer CLI entry point
//!
//! Parses command-line arguments, runs the requested workflow, and renders
//! infrastructure failures as user-friendly errors.

use anyhow::Result;
use clap::Parser;
use skeleton_installer::cli;
use skeleton_installer::core::error::user_friendly_error;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute() {
        Ok(()) => Ok(()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}

//! aimgr CLI entry point
//!
//! Parses arguments, runs the command and renders errors with suggestions.

use aimgr::cli;
use aimgr::core::user_friendly_error;
use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        let error_ctx = user_friendly_error(e);
        error_ctx.display();
        std::process::exit(1);
    }
}

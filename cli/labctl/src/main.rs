//! labctl - operator CLI for the labsync synchronization engine.
//!
//! Inspects and drives the device service and management service the same
//! way end-to-end scenarios do: reset the environment, provision
//! instruments, stage results, cancel stuck runs.

use anyhow::Result;
use clap::Parser;

mod commands;
mod config;
mod error;
mod logging;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = cli.run().await {
        error::print_error(&e);
        std::process::exit(1);
    }

    Ok(())
}

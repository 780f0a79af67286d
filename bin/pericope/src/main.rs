//! Pericope scripture browser.
//!
//! Runs the client and the companion in one process, joined by a simulated
//! link that drops a configurable share of outbound transmissions.

mod cli;
mod commands;
mod config;
mod link;
mod logging;

use clap::Parser;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = cli::Cli::parse();
    logging::init_logging(&cli.logs)?;
    commands::run(cli).await
}

//! pubwatch CLI: daily monitor for institutional publication releases.
//!
//! Crawls configured institution pages, keeps the latest known publication
//! per source, and regenerates an HTML dashboard.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}

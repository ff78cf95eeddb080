mod cli;
mod config;
mod service;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;
use service::ReviewService;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration; command-line flags win
    let mut config = Config::load()?;
    config.apply_cli(&cli);

    let service = ReviewService::new(config);
    service.run(cli.command).await
}

//! Infratest CLI Binary
//!
//! Drives the test lifecycle stages against an IaC fixture.

use anyhow::Result;
use clap::Parser;

use infratest::cli::{self, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let args = Cli::parse();

    match args.command {
        Commands::Setup => cli::setup(&args)?,
        Commands::Validate => cli::validate(&args).await?,
        Commands::Teardown => cli::teardown(&args)?,
        Commands::Run => cli::run(&args).await?,
    }

    Ok(())
}

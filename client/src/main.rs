use anyhow::Result;
use clap::Parser;
use forsla::cli::Cli;
use forsla::config::Config;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env()?,
        )
        .init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref());
    forsla::run(cli, config).await
}

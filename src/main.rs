//! pytestgen - generate pytest suites with an Azure OpenAI chat deployment

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pytestgen::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // .env values never override variables already set
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pytestgen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if dotenv_loaded {
        tracing::debug!("Loaded environment from .env");
    }

    Cli::parse().run().await
}

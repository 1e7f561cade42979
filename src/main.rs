use anyhow::Context;
use clap::Parser;

use prior_auth_codes::{batch, cli, lookup, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    match args.cmd {
        cli::Command::Extract(cmd) => batch::run(cmd).await.context("extract failed"),
        cli::Command::Classify(cmd) => lookup::run(cmd).context("classify failed"),
        cli::Command::Serve(cmd) => server::run(cmd).await.context("serve failed"),
    }
}

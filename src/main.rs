use anyhow::Context;
use clap::Parser;
use precip_audit::cli::{run, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).await.context("precip-audit failed")
}

use anyhow::Result;
use civicgit_client::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
  Cli::parse().run().await
}

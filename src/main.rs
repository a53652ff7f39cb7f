use anyhow::Result;
use gmail_relay::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}

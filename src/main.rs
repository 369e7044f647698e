use anyhow::Result;
use clap::Parser;

mod cache;
mod cli;
mod config;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    model::init_tracing("billcycle=info,compute=info,sea_orm=warn");

    let cli = Cli::parse();
    cli.run().await?;

    Ok(())
}

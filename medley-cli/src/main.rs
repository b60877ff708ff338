//! Medley CLI - Command-line interface
//!
//! Provides command-line access to Medley functionality.

mod commands;

use clap::Parser;

#[derive(Parser)]
#[command(name = "medley")]
#[command(about = "A stock media metasearch server")]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    commands::handle_command(cli.command).await?;

    Ok(())
}

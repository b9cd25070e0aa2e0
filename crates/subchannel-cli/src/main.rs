//! subchannel - filtered views of conda channels

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use subchannel_cli::cmd;
use subchannel_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            cmd::completions::completions(shell);
            Ok(())
        }
        None => cmd::filter::filter(&cli.filter, cli.dry_run, cli.quiet).await,
    }
}

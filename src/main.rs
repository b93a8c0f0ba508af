use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use adlist_sync::app::AppContext;
use adlist_sync::cli::{commands, Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut ctx = AppContext::new(cli.config.as_deref(), &cli.env_file)?;

    match cli.command {
        Commands::Sync {
            seed,
            output,
            dry_run,
        } => {
            commands::sync(&mut ctx, seed.as_deref(), output.as_deref(), dry_run).await?;
        }
        Commands::Hosts { client } => {
            commands::hosts(&mut ctx, client.as_deref()).await?;
        }
    }

    Ok(())
}

use clap::Parser;
use orgcatalog::cli::{run_seed, run_serve, Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => {
            run_serve(args.port, args.api_key, cli.db)?;
        }
        Commands::Seed => {
            run_seed(cli.db)?;
        }
    }

    Ok(())
}

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod seed;
pub mod serve;

pub use seed::run_seed;
pub use serve::run_serve;

#[derive(Parser)]
#[command(name = "orgcatalog")]
#[command(about = "Directory service for organizations, buildings and business activities")]
#[command(version)]
pub struct Cli {
    /// Override the database file location
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),
    /// Load demo fixtures into the database
    Seed,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(short, long, default_value = "8080")]
    pub port: u16,
    /// Static key clients must send in the x-api-key header
    /// (falls back to the ORGCATALOG_API_KEY environment variable)
    #[arg(long)]
    pub api_key: Option<String>,
}

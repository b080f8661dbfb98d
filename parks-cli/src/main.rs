//! parksctl - run and administer the Tunisia national parks API

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod env;
mod tracing_setup;

use tracing_setup::{init_tracing, TracingConfig};

#[derive(Parser, Debug)]
#[command(
    name = "parksctl",
    author,
    version,
    about = "Tunisia national parks API server and admin tooling"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API server
    Serve(commands::serve::ServeArgs),
    /// Apply the database schema and exit
    Migrate(commands::migrate::MigrateArgs),
    /// Load the built-in sample dataset
    Seed(commands::seed::SeedArgs),
    /// Print an argon2 hash suitable for ADMIN_PASSWORD_HASH
    HashPassword(commands::hash_password::HashPasswordArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing so clap's `env` fallbacks see .env values
    let loaded = env::load_dotenv();
    let cli = Cli::parse();
    init_tracing(&TracingConfig { debug: cli.debug }).ok();

    for path in &loaded {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Serve(args) => commands::run_serve(args).await?,
        Commands::Migrate(args) => commands::run_migrate(args).await?,
        Commands::Seed(args) => commands::run_seed(args).await?,
        Commands::HashPassword(args) => commands::run_hash_password(args)?,
    }

    Ok(())
}

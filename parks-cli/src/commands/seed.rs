//! Sample data command

use anyhow::{Context, Result};
use clap::Parser;

use parks_server::seed;

#[derive(Parser, Debug)]
pub struct SeedArgs {
    /// Database URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Delete all existing rows before seeding
    #[arg(long)]
    pub reset: bool,
}

pub async fn run_seed(args: SeedArgs) -> Result<()> {
    let pool = super::open_database(args.database_url).await?;
    let summary = seed::seed(&pool, args.reset)
        .await
        .context("Failed to seed database")?;
    pool.close().await;

    if summary.skipped {
        println!("Database already contains parks; use --reset to reseed");
    } else {
        println!(
            "Seeded {} parks, {} species ({} park links), {} trails, {} badges",
            summary.parks, summary.species, summary.links, summary.trails, summary.badges
        );
    }
    Ok(())
}

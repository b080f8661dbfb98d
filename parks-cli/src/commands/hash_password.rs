//! Password hashing helper for ADMIN_PASSWORD_HASH

use anyhow::{Context, Result};
use clap::Parser;

use parks_server::auth::password::hash_password;

#[derive(Parser, Debug)]
pub struct HashPasswordArgs {
    /// Password to hash
    pub password: String,
}

pub fn run_hash_password(args: HashPasswordArgs) -> Result<()> {
    let hash = hash_password(&args.password).context("Failed to hash password")?;
    println!("{hash}");
    Ok(())
}

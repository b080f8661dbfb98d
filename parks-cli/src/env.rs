//! `.env` loading
//!
//! `./.env` wins over `~/.parksctl/.env`; variables already in the
//! environment win over both.

use std::path::PathBuf;

pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".parksctl"))
}

/// Returns the files that were loaded. Runs before logging is set up.
pub fn load_dotenv() -> Vec<PathBuf> {
    let mut loaded = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() && dotenvy::from_path(&env_file).is_ok() {
            loaded.push(env_file);
        }
    }

    loaded
}

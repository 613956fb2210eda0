// src/utils/env.rs
use log::{debug, info};

const ENV_FILES: [&str; 3] = [".env", ".env.local", "../.env"];

/// Loads the first `.env` file found. Variables already set in the process
/// environment are never overridden.
pub fn load_env() {
    for file in ENV_FILES {
        match dotenv::from_filename(file) {
            Ok(path) => {
                info!("Loaded environment variables from {}", path.display());
                return;
            }
            Err(e) => debug!("No env file at {}: {}", file, e),
        }
    }
    debug!("No .env file found, using process environment only");
}

//! Filename-prefix filtering for input files.
//! Lets a run pick up only the batches written by specific scrapers or vendors
//! (e.g. `tier1_*.json`) from a shared input directory.

use log::{debug, info};
use std::env;

#[derive(Debug, Clone, Default)]
pub struct SourceFilterConfig {
    pub enabled: bool,
    pub allowed_prefixes: Vec<String>,
}

fn split_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl SourceFilterConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let enabled = env::var("SOURCE_FILTER_ENABLED")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let allowed_prefixes = if enabled {
            split_prefixes(&env::var("ALLOWED_FILE_PREFIXES").unwrap_or_default())
        } else {
            Vec::new()
        };

        debug!("Source filter config: enabled={}, prefixes={:?}", enabled, allowed_prefixes);

        Self { enabled, allowed_prefixes }
    }

    /// Prefixes given on the command line replace whatever the environment set.
    pub fn with_cli_prefixes(self, prefixes: &[String]) -> Self {
        if prefixes.is_empty() {
            return self;
        }
        Self {
            enabled: true,
            allowed_prefixes: prefixes.iter().flat_map(|p| split_prefixes(p)).collect(),
        }
    }

    /// Check if filtering is effectively enabled (both flag and prefixes present)
    pub fn is_active(&self) -> bool {
        self.enabled && !self.allowed_prefixes.is_empty()
    }

    pub fn allows(&self, file_name: &str) -> bool {
        !self.is_active() || self.allowed_prefixes.iter().any(|p| file_name.starts_with(p.as_str()))
    }

    pub fn log_config(&self) {
        if self.is_active() {
            info!("🔍 Source file filtering ENABLED");
            info!("   Allowed file prefixes: {:?}", self.allowed_prefixes);
        } else {
            info!("🔍 Source file filtering DISABLED - loading every .json file");
        }
    }
}

// src/geocoding/config.rs

use log::info;
use std::env;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Identifying client header required by the provider's usage policy.
    pub user_agent: String,
    pub country_codes: Vec<String>,
    /// Minimum gap between any two outbound requests, retries included.
    pub min_interval: Duration,
    /// Base backoff; attempt `n` waits `n × retry_delay` before attempt `n + 1`.
    pub retry_delay: Duration,
    pub max_attempts: u32,
    pub timeout: Duration,
    pub result_limit: u32,
    pub min_confidence: f64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("location-dedupe/{}", env!("CARGO_PKG_VERSION")),
            country_codes: vec!["us".to_string(), "ca".to_string()],
            min_interval: Duration::from_millis(1100),
            retry_delay: Duration::from_millis(2000),
            max_attempts: 3,
            timeout: Duration::from_secs(30),
            result_limit: 5,
            min_confidence: 0.1,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl GeocoderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let country_codes = env::var("GEOCODER_COUNTRY_CODES")
            .map(|raw| {
                raw.split(',')
                    .map(|c| c.trim().to_lowercase())
                    .filter(|c| !c.is_empty())
                    .collect::<Vec<_>>()
            })
            .unwrap_or(defaults.country_codes);

        Self {
            base_url: env::var("GEOCODER_BASE_URL").unwrap_or(defaults.base_url),
            user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or(defaults.user_agent),
            country_codes,
            min_interval: Duration::from_millis(env_or("GEOCODER_MIN_INTERVAL_MS", 1100)),
            retry_delay: Duration::from_millis(env_or("GEOCODER_RETRY_DELAY_MS", 2000)),
            max_attempts: env_or("GEOCODER_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            timeout: Duration::from_secs(env_or("GEOCODER_TIMEOUT_SECS", 30)),
            result_limit: env_or("GEOCODER_RESULT_LIMIT", defaults.result_limit).max(1),
            min_confidence: env_or("GEOCODER_MIN_CONFIDENCE", defaults.min_confidence),
        }
    }

    pub fn log_config(&self) {
        info!("🛰️  Geocoder: {} (agent: {})", self.base_url, self.user_agent);
        info!(
            "   Countries: {:?}, min interval {:?}, {} attempts (backoff {:?} × attempt), min confidence {:.2}",
            self.country_codes, self.min_interval, self.max_attempts, self.retry_delay, self.min_confidence
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeocoderConfig::default();
        assert_eq!(config.min_interval, Duration::from_millis(1100));
        assert_eq!(config.retry_delay, Duration::from_millis(2000));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.country_codes, vec!["us", "ca"]);
        assert!(config.user_agent.starts_with("location-dedupe/"));
    }

    #[test]
    fn test_env_config() {
        env::set_var("GEOCODER_COUNTRY_CODES", "US, mx,");
        env::set_var("GEOCODER_MAX_ATTEMPTS", "0");
        env::set_var("GEOCODER_MIN_INTERVAL_MS", "1500");
        env::set_var("GEOCODER_MIN_CONFIDENCE", "oops");

        let config = GeocoderConfig::from_env();
        assert_eq!(config.country_codes, vec!["us", "mx"]);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.min_interval, Duration::from_millis(1500));
        assert_eq!(config.min_confidence, 0.1);

        env::remove_var("GEOCODER_COUNTRY_CODES");
        env::remove_var("GEOCODER_MAX_ATTEMPTS");
        env::remove_var("GEOCODER_MIN_INTERVAL_MS");
        env::remove_var("GEOCODER_MIN_CONFIDENCE");
    }
}

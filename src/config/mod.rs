//! Configuration module for the forum client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default institutional SSO host.
pub const DEFAULT_SSO_URL: &str = "https://sso.tech-iitb.org";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted backend (REST data API and auth API)
    pub backend_url: String,
    /// Public API key sent to the hosted backend
    pub backend_key: String,
    /// Base URL of the SSO identity endpoint
    pub sso_url: String,
    /// Path to the SQLite file backing the local cache
    pub cache_path: PathBuf,
    /// Address the local API binds to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// How long a failed-vote banner stays visible
    pub vote_error_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let backend_url = env::var("FORUM_BACKEND_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:54321".to_string())
            .trim_end_matches('/')
            .to_string();

        let backend_key = env::var("FORUM_BACKEND_KEY").unwrap_or_default();

        let sso_url = env::var("FORUM_SSO_URL")
            .unwrap_or_else(|_| DEFAULT_SSO_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cache_path = env::var("FORUM_CACHE_PATH")
            .unwrap_or_else(|_| "./data/cache.sqlite".to_string())
            .into();

        let bind_addr = env::var("FORUM_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .map_err(|e| format!("Invalid FORUM_BIND_ADDR format: {}", e))?;

        let log_level = env::var("FORUM_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let vote_error_secs: u64 = env::var("FORUM_VOTE_ERROR_SECS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .map_err(|e| format!("Invalid FORUM_VOTE_ERROR_SECS value: {}", e))?;

        Ok(Self {
            backend_url,
            backend_key,
            sso_url,
            cache_path,
            bind_addr,
            log_level,
            vote_error_ttl: Duration::from_secs(vote_error_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("FORUM_BACKEND_URL");
        env::remove_var("FORUM_BACKEND_KEY");
        env::remove_var("FORUM_SSO_URL");
        env::remove_var("FORUM_CACHE_PATH");
        env::remove_var("FORUM_BIND_ADDR");
        env::remove_var("FORUM_LOG_LEVEL");
        env::remove_var("FORUM_VOTE_ERROR_SECS");

        let config = Config::from_env().unwrap();

        assert_eq!(config.backend_url, "http://127.0.0.1:54321");
        assert!(config.backend_key.is_empty());
        assert_eq!(config.sso_url, DEFAULT_SSO_URL);
        assert_eq!(config.cache_path, PathBuf::from("./data/cache.sqlite"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.vote_error_ttl, Duration::from_secs(3));
    }
}

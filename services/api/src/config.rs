//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Where browsers reach this service. Used for OAuth redirects and CORS.
    pub public_base_url: String,
    pub oauth_provider: String,
    pub reply_delay: Duration,
    pub cookie_secure: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Hosted Backend ---
        let supabase_url = lookup("SUPABASE_URL")
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();
        let supabase_anon_key = lookup("SUPABASE_ANON_KEY")
            .ok_or_else(|| ConfigError::MissingVar("SUPABASE_ANON_KEY".to_string()))?;

        // --- Web Settings ---
        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();
        let oauth_provider = lookup("OAUTH_PROVIDER").unwrap_or_else(|| "google".to_string());

        let reply_delay_str = lookup("REPLY_DELAY_MS").unwrap_or_else(|| "1000".to_string());
        let reply_delay = reply_delay_str
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidValue("REPLY_DELAY_MS".to_string(), e.to_string()))?;

        let cookie_secure_str = lookup("COOKIE_SECURE").unwrap_or_else(|| "true".to_string());
        let cookie_secure = cookie_secure_str.parse::<bool>().map_err(|e| {
            ConfigError::InvalidValue("COOKIE_SECURE".to_string(), e.to_string())
        })?;

        Ok(Self {
            bind_address,
            log_level,
            supabase_url,
            supabase_anon_key,
            public_base_url,
            oauth_provider,
            reply_delay,
            cookie_secure,
        })
    }

    /// The URL the identity provider sends the browser back to after OAuth.
    pub fn oauth_callback_url(&self) -> String {
        format!("{}/auth/callback", self.public_base_url)
    }
}

//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `QUICKBITE_API_BASE` - Base URL of the backend API gateway
//!
//! ## Optional
//! - `QUICKBITE_SESSION_TOKEN` - Pre-provisioned session bearer token
//! - `QUICKBITE_POLL_INTERVAL_SECS` - Live tracking poll interval (default: 10)
//! - `QUICKBITE_VERIFY_DELAY_MS` - Post-create order verification delay (default: 1500)
//! - `QUICKBITE_GEO_TIMEOUT_SECS` - Device geolocation timeout (default: 5)

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example-token",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront client engine configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the backend API gateway.
    pub api_base: Url,
    /// Pre-provisioned session token, if any.
    pub session_token: Option<SecretString>,
    /// Live tracking poll interval.
    pub poll_interval: Duration,
    /// Delay before re-fetching a freshly created order, to guard
    /// against read-after-write lag in the backend.
    pub verify_delay: Duration,
    /// Timeout for device geolocation acquisition.
    pub geolocation_timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_base", &self.api_base.as_str())
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("poll_interval", &self.poll_interval)
            .field("verify_delay", &self.verify_delay)
            .field("geolocation_timeout", &self.geolocation_timeout)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if a provided token fails placeholder validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base = get_env("QUICKBITE_API_BASE")?;
        let api_base = Url::parse(&api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("QUICKBITE_API_BASE".into(), e.to_string()))?;

        let session_token = match std::env::var("QUICKBITE_SESSION_TOKEN") {
            Ok(raw) if !raw.trim().is_empty() => {
                let token = SecretString::from(raw);
                validate_token("QUICKBITE_SESSION_TOKEN", &token)?;
                Some(token)
            }
            _ => None,
        };

        let poll_interval =
            Duration::from_secs(get_parsed_or("QUICKBITE_POLL_INTERVAL_SECS", 10)?);
        let verify_delay = Duration::from_millis(get_parsed_or("QUICKBITE_VERIFY_DELAY_MS", 1500)?);
        let geolocation_timeout =
            Duration::from_secs(get_parsed_or("QUICKBITE_GEO_TIMEOUT_SECS", 5)?);

        Ok(Self {
            api_base,
            session_token,
            poll_interval,
            verify_delay,
            geolocation_timeout,
        })
    }

    /// Build a configuration for a known gateway with library defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base` is not a valid URL.
    pub fn for_gateway(api_base: &str) -> Result<Self, ConfigError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| ConfigError::InvalidEnvVar("api_base".into(), e.to_string()))?;
        Ok(Self {
            api_base,
            session_token: None,
            poll_interval: Duration::from_secs(10),
            verify_delay: Duration::from_millis(1500),
            geolocation_timeout: Duration::from_secs(5),
        })
    }
}

fn get_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn get_parsed_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Reject tokens that look like unconfigured placeholders.
fn validate_token(name: &str, token: &SecretString) -> Result<(), ConfigError> {
    let value = token.expose_secret().to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if value.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_string(),
                format!("looks like a placeholder (contains \"{pattern}\")"),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_gateway_defaults() {
        let config = ClientConfig::for_gateway("https://api.quickbite.example").expect("config");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
        assert_eq!(config.verify_delay, Duration::from_millis(1500));
        assert_eq!(config.geolocation_timeout, Duration::from_secs(5));
        assert!(config.session_token.is_none());
    }

    #[test]
    fn test_for_gateway_rejects_bad_url() {
        assert!(ClientConfig::for_gateway("not a url").is_err());
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let token = SecretString::from("your-token-here");
        let result = validate_token("QUICKBITE_SESSION_TOKEN", &token);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_real_looking_token_accepted() {
        let token = SecretString::from("qb_8f3a91c2d4e5");
        assert!(validate_token("QUICKBITE_SESSION_TOKEN", &token).is_ok());
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = ClientConfig::for_gateway("https://api.quickbite.example").expect("config");
        config.session_token = Some(SecretString::from("super-secret"));
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
    }
}

// ============================================================================
// Exposure Config - Centralized configuration management
// ============================================================================
//
// Configuration for the federation sync runner and the components it wires
// together. Loaded from environment variables (and an optional .env file)
// with sensible defaults.
//
// ============================================================================

mod constants;
mod database;
mod federation;
mod logging;
mod verification;

pub use constants::{BATCH_CONTENT_TYPE, PUBLISH_TOKEN_HEADER};
pub use database::DbConfig;
pub use federation::{FederationConfig, MtlsConfig};
pub use logging::{LogFormat, LoggingConfig};
pub use verification::VerificationConfig;

use anyhow::Result;
use std::str::FromStr;

/// Variable lookup used by the sub-configurations
pub(crate) type Lookup<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Main configuration structure
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub database_url: String,

    // Sub-configurations
    pub logging: LoggingConfig,
    pub db: DbConfig,
    pub federation: FederationConfig,
    /// Present only when `VERIFICATION_SERVICE_URL` is set
    pub verification: Option<VerificationConfig>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env: Lookup<'_> = &lookup;

        let database_url = match env("DATABASE_URL") {
            Some(url) => url,
            None => anyhow::bail!("DATABASE_URL must be set"),
        };

        Ok(Self {
            database_url,
            logging: LoggingConfig::from_lookup(env)?,
            db: DbConfig::from_lookup(env)?,
            federation: FederationConfig::from_lookup(env)?,
            verification: VerificationConfig::from_lookup(env)?,
        })
    }
}

/// Value of `key`, or `default` when unset. A set value that does not parse
/// is an error.
pub(crate) fn parse_or<T>(env: Lookup<'_>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(e) => anyhow::bail!("Invalid {}: '{}' ({})", key, raw, e),
        },
    }
}

/// Accepts only "true" or "false"
pub(crate) fn parse_bool(env: Lookup<'_>, key: &str, default: bool) -> Result<bool> {
    parse_or(env, key, default)
}

/// Timeout in seconds, at least 1
pub(crate) fn parse_timeout(env: Lookup<'_>, key: &str, default: u64) -> Result<u64> {
    let secs = parse_or(env, key, default)?;
    if secs == 0 {
        anyhow::bail!("{} must be at least 1 second", key);
    }
    Ok(secs)
}

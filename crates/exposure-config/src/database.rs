// ============================================================================
// Database Configuration
// ============================================================================

use anyhow::Result;

use crate::constants::*;
use crate::{Lookup, parse_or, parse_timeout};

/// Database connection pool configuration
#[derive(Clone, Debug, PartialEq)]
pub struct DbConfig {
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool (seconds)
    pub acquire_timeout_secs: u64,
    /// Timeout for idle connections before they are closed (seconds)
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    pub(crate) fn from_lookup(env: Lookup<'_>) -> Result<Self> {
        Ok(Self {
            max_connections: parse_or(env, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            acquire_timeout_secs: parse_timeout(
                env,
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or(env, "DB_IDLE_TIMEOUT_SECS", DEFAULT_DB_IDLE_TIMEOUT_SECS)?,
        })
    }
}

// ============================================================================
// Publish Token Verification Service Configuration
// ============================================================================

use anyhow::Result;

use crate::constants::*;
use crate::{Lookup, parse_timeout};

#[derive(Clone, Debug, PartialEq)]
pub struct VerificationConfig {
    /// Full URL of the verification endpoint
    pub service_url: String,
    pub timeout_secs: u64,
}

impl VerificationConfig {
    /// `None` when no verification service is configured
    pub(crate) fn from_lookup(env: Lookup<'_>) -> Result<Option<Self>> {
        let service_url = match env("VERIFICATION_SERVICE_URL") {
            None => return Ok(None),
            Some(url) if url.trim().is_empty() => {
                anyhow::bail!("VERIFICATION_SERVICE_URL is set but empty")
            }
            Some(url) => url.trim().to_string(),
        };

        Ok(Some(Self {
            service_url,
            timeout_secs: parse_timeout(
                env,
                "VERIFICATION_TIMEOUT_SECS",
                DEFAULT_VERIFICATION_TIMEOUT_SECS,
            )?,
        }))
    }
}

// ============================================================================
// Federation Gateway Configuration
// ============================================================================

use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::constants::*;
use crate::{Lookup, parse_bool, parse_or, parse_timeout};

/// Client certificate settings for the gateway connection
#[derive(Clone, Debug, PartialEq)]
pub struct MtlsConfig {
    /// Path to the PEM client certificate presented to the gateway
    pub client_cert_path: Option<String>,
    /// Path to the PEM private key of the client certificate
    pub client_key_path: Option<String>,
    /// Whether to verify the gateway's server certificate (should be true in production)
    pub verify_server_cert: bool,
}

impl Default for MtlsConfig {
    fn default() -> Self {
        Self {
            client_cert_path: None,
            client_key_path: None,
            verify_server_cert: true,
        }
    }
}

/// Federation gateway configuration
#[derive(Clone, Debug, PartialEq)]
pub struct FederationConfig {
    /// Whether federation sync is enabled
    pub enabled: bool,
    /// Gateway base URL (e.g., "https://efgs.example.eu")
    pub gateway_url: String,
    /// Per-request timeout for gateway calls
    pub timeout_secs: u64,
    /// Maximum pages fetched in one download run
    pub max_pages: usize,
    /// Batch signing key seed (base64-encoded 32 bytes for Ed25519)
    /// Generate with: openssl rand -base64 32
    pub signing_key_seed: Option<String>,
    pub mtls: MtlsConfig,
}

impl FederationConfig {
    pub(crate) fn from_lookup(env: Lookup<'_>) -> Result<Self> {
        let enabled = parse_bool(env, "FEDERATION_ENABLED", false)?;
        let signing_key_seed = env("FEDERATION_SIGNING_KEY");
        let gateway_url = env("FEDERATION_GATEWAY_URL").unwrap_or_default();

        // Unsigned batches are refused by the gateway; disable sync instead of
        // failing every upload at runtime.
        let enabled = if enabled && signing_key_seed.is_none() {
            tracing::error!(
                "FEDERATION_ENABLED=true but FEDERATION_SIGNING_KEY is not set. \
                 Federation sync will be DISABLED. \
                 Generate key with: openssl rand -base64 32"
            );
            false
        } else {
            enabled
        };

        if enabled {
            if gateway_url.trim().is_empty() {
                anyhow::bail!("FEDERATION_GATEWAY_URL is required when FEDERATION_ENABLED=true");
            }

            if let Some(ref key) = signing_key_seed {
                let decoded = match BASE64.decode(key.trim()) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        anyhow::bail!("FEDERATION_SIGNING_KEY is not valid base64: {}", e);
                    }
                };
                if decoded.len() != 32 {
                    anyhow::bail!(
                        "FEDERATION_SIGNING_KEY must decode to exactly 32 bytes (got {} bytes). \
                         Generate with: openssl rand -base64 32",
                        decoded.len()
                    );
                }
            }
        }

        let max_pages = parse_or(env, "FEDERATION_MAX_PAGES", DEFAULT_FEDERATION_MAX_PAGES)?;
        if max_pages == 0 {
            anyhow::bail!("FEDERATION_MAX_PAGES must be at least 1");
        }

        let mtls = MtlsConfig {
            client_cert_path: env("FEDERATION_CLIENT_CERT_PATH"),
            client_key_path: env("FEDERATION_CLIENT_KEY_PATH"),
            verify_server_cert: parse_bool(env, "FEDERATION_VERIFY_SERVER_CERT", true)?,
        };

        if mtls.client_cert_path.is_some() != mtls.client_key_path.is_some() {
            anyhow::bail!(
                "FEDERATION_CLIENT_CERT_PATH and FEDERATION_CLIENT_KEY_PATH must be set together"
            );
        }

        let timeout_secs =
            parse_timeout(env, "FEDERATION_TIMEOUT_SECS", DEFAULT_FEDERATION_TIMEOUT_SECS)?;

        Ok(Self {
            enabled,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            timeout_secs,
            max_pages,
            signing_key_seed,
            mtls,
        })
    }
}

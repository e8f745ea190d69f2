// ============================================================================
// Configuration Constants
// ============================================================================

// Transport timeouts (in seconds)
pub(crate) const DEFAULT_FEDERATION_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_VERIFICATION_TIMEOUT_SECS: u64 = 10;

// Upper bound on download pages per sync run.
// A day partition rarely holds more than a few hundred batches.
pub(crate) const DEFAULT_FEDERATION_MAX_PAGES: usize = 1000;

// Database pool
pub(crate) const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
pub(crate) const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;
pub(crate) const DEFAULT_DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Media type of the gateway batch format
pub const BATCH_CONTENT_TYPE: &str = "application/protobuf; version=1.0";

/// Header carrying the publish token on verification requests
pub const PUBLISH_TOKEN_HEADER: &str = "KV-Publish-Token";

// ============================================================================
// Exposure Server
// ============================================================================
//
// Federation gateway synchronization and exposure configuration
// distribution for a national exposure notification backend.
//
// - configuration: single-flight cache over the latest published configuration
// - federation:    gateway client, batch codec/signing, sync engine
// - verification:  publish token checks against the remote verification service
// - transport:     HTTP request/response seam with per-call timeouts
// - db:            Postgres collaborators
//
// ============================================================================

pub mod configuration;
pub mod db;
pub mod error;
pub mod federation;
pub mod transport;
pub mod verification;

pub use configuration::{ConfigStore, ConfigurationCache};
pub use error::{ConfigurationUnavailable, CoreError, CoreResult, StoreError};
pub use federation::{FederationGatewayClient, FederationSyncEngine, SyncError};
pub use transport::{GatewayTransport, HttpTransport, TransportError};
pub use verification::{PublishTokenVerifier, TokenLedger, VerificationError};

// ============================================================================
// Verification Module - Publish Token Checks
// ============================================================================

pub mod ledger;
pub mod verifier;

pub use ledger::TokenLedger;
pub use verifier::{PublishTokenVerifier, VerificationError, require_accepted};

// ============================================================================
// Core Error Taxonomy
// ============================================================================
//
// Every component returns its own typed error; `CoreError` is the closed set
// the rest of the service reasons about. The mapping to API responses lives
// here too, so status-code decisions are made once.
//
// ============================================================================

use exposure_error::AppError;
use exposure_types::PublishTokenError;
use thiserror::Error;

use crate::federation::SyncError;
use crate::transport::TransportError;
use crate::verification::VerificationError;

pub type CoreResult<T> = Result<T, CoreError>;

/// Failure reported by a persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError(err.to_string())
    }
}

/// The latest configuration could not be loaded.
///
/// Cloneable: every caller joined to the same in-flight fetch receives it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationUnavailable {
    #[error("no exposure configuration has been published")]
    NoConfiguration,

    #[error("configuration store failed: {0}")]
    Store(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("transport failure: {0}")]
    TransportFailure(#[from] TransportError),

    #[error("configuration unavailable: {0}")]
    ConfigurationUnavailable(#[from] ConfigurationUnavailable),

    #[error("publish token syntax invalid: {0}")]
    TokenSyntaxInvalid(PublishTokenError),

    #[error("publish token rejected")]
    TokenRejected,

    #[error("verification service unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("federation sync failed: {0}")]
    SyncFailed(#[from] SyncError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<VerificationError> for CoreError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::TokenSyntaxInvalid(e) => CoreError::TokenSyntaxInvalid(e),
            VerificationError::VerificationUnavailable(reason) => {
                CoreError::VerificationUnavailable(reason)
            }
            VerificationError::Ledger(e) => CoreError::Store(e),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TransportFailure(e) => AppError::Transport(e.to_string()),
            CoreError::ConfigurationUnavailable(e) => AppError::ConfigurationUnavailable(e.to_string()),
            CoreError::TokenSyntaxInvalid(e) => AppError::InvalidPublishToken(e.to_string()),
            CoreError::TokenRejected => AppError::PublishTokenRejected,
            CoreError::VerificationUnavailable(reason) => AppError::VerificationUnavailable(reason),
            CoreError::SyncFailed(e) => AppError::Federation(e.to_string()),
            CoreError::Store(e) => AppError::Internal(e.to_string()),
        }
    }
}

use async_trait::async_trait;
use exposure_types::{PublishToken, PublishTokenVerification};

use crate::error::StoreError;

/// Record of publish tokens that passed verification.
///
/// A token is persisted when accepted and deleted once its keys have been
/// published, so each token authorizes a single publication.
#[async_trait]
pub trait TokenLedger: Send + Sync {
    async fn persist(
        &self,
        token: &PublishToken,
        verification: &PublishTokenVerification,
    ) -> Result<(), StoreError>;

    /// Returns whether a recorded token was removed
    async fn delete(&self, token: &PublishToken) -> Result<bool, StoreError>;
}

use async_trait::async_trait;
use exposure_types::ExposureConfiguration;

use crate::error::StoreError;

/// Persistent source of published exposure configurations
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// The configuration with the highest version, or `None` when nothing has
    /// been published yet
    async fn fetch_latest(&self) -> Result<Option<ExposureConfiguration>, StoreError>;
}

// ============================================================================
// Configuration Module - Exposure Configuration Distribution
// ============================================================================

pub mod cache;
pub mod store;

pub use cache::ConfigurationCache;
pub use store::ConfigStore;

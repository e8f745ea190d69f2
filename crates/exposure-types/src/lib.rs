// ============================================================================
// Exposure Types - Core Data Types
// ============================================================================
//
// Data structures shared by the configuration cache, the federation sync
// engine and the publish token verifier. No dependencies on databases,
// HTTP clients or business logic.
//
// Contents:
// - Exposure risk-scoring configuration
// - Diagnosis key batches and batch tags (federation cursor)
// - Publish tokens and their verification results
//
// ============================================================================

pub mod batch;
pub mod configuration;
pub mod token;

pub use batch::*;
pub use configuration::*;
pub use token::*;

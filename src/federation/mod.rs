// ============================================================================
// Federation Module - Gateway Synchronization
// ============================================================================

pub mod client;
pub mod codec;
pub mod partition;
pub mod signing;
pub mod sync;
pub mod tags;

pub use client::{DownloadedPage, FederationGatewayClient};
pub use codec::{BatchCodec, CodecError, ProtobufBatchCodec};
pub use partition::PartitionLocks;
pub use signing::{BatchSigner, Ed25519BatchSigner, SigningError};
pub use sync::{
    BatchInbox, DownloadReport, DownloadState, FederationSyncEngine, KeyCollector, SyncError,
    UploadOutcome, UploadState,
};
pub use tags::{BatchTagSource, UuidBatchTagSource};

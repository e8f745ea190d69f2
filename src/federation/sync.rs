// ============================================================================
// Federation Sync Engine
// ============================================================================
//
// Drives one synchronization run against the gateway, per direction:
//
//   Upload:    Idle -> Collecting -> Uploading -> Succeeded | Failed
//   Download:  Idle -> Fetching (loop) -> Draining -> Done | Failed
//
// Download pages are fetched strictly in sequence, each request carrying the
// cursor from the previous response. Received batches are held in memory and
// handed to the inbox only once pagination has terminated normally; a failed
// run hands off nothing.
//
// Runs for the same day-partition are serialized through `PartitionLocks`;
// every engine shares the process-wide set unless given its own.
// Nothing is retried here; retry policy belongs to the scheduler invoking
// the engine.
//
// ============================================================================

use async_trait::async_trait;
use chrono::NaiveDate;
use exposure_metrics::{SYNC_PAGES_DOWNLOADED_TOTAL, SYNC_RUNS_TOTAL, SYNC_UPLOAD_STATUS_TOTAL};
use exposure_types::{BatchTag, DiagnosisKey, DiagnosisKeyBatch, ReceivedBatch};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::client::FederationGatewayClient;
use super::codec::{BatchCodec, CodecError};
use super::partition::PartitionLocks;
use super::signing::{BatchSigner, SigningError};
use super::tags::BatchTagSource;
use crate::transport::TransportError;

/// Selects the local keys eligible for upload on a given day
#[async_trait]
pub trait KeyCollector: Send + Sync {
    async fn collect(&self, date: NaiveDate) -> anyhow::Result<Vec<DiagnosisKey>>;
}

/// Receives the batches of a completed download run
#[async_trait]
pub trait BatchInbox: Send + Sync {
    async fn accept(&self, date: NaiveDate, batches: Vec<ReceivedBatch>) -> anyhow::Result<()>;
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("gateway transport failed: {0}")]
    Transport(#[from] TransportError),

    #[error("gateway refused batch {batch_tag} with status {status}")]
    UploadRejected {
        batch_tag: BatchTag,
        status: StatusCode,
    },

    #[error("gateway answered download with status {status}")]
    UnexpectedStatus { status: StatusCode },

    #[error("failed to decode page {page}: {source}")]
    Decode { page: usize, source: CodecError },

    #[error("gateway repeated continuation tag {0}")]
    RepeatedTag(BatchTag),

    #[error("download did not terminate within {0} pages")]
    PageLimitExceeded(usize),

    #[error("batch signing failed: {0}")]
    Signing(#[from] SigningError),

    #[error("key collection failed: {0}")]
    Collect(anyhow::Error),

    #[error("batch hand-off failed: {0}")]
    Inbox(anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    Collecting,
    Uploading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Idle,
    Fetching,
    Draining,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded {
        batch_tag: BatchTag,
        status: StatusCode,
        key_count: usize,
    },
    /// The collector found no eligible keys; the gateway was not called
    NothingToUpload,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Requests issued, including the terminating one
    pub pages_requested: usize,
    pub batches_received: usize,
    pub keys_received: usize,
    /// Tag of the last batch received
    pub last_batch_tag: Option<BatchTag>,
}

/// State of one run, logged on every transition
struct RunState<S> {
    direction: &'static str,
    date: NaiveDate,
    state: S,
}

impl<S: Copy + fmt::Debug> RunState<S> {
    fn new(direction: &'static str, date: NaiveDate, initial: S) -> Self {
        Self {
            direction,
            date,
            state: initial,
        }
    }

    fn advance(&mut self, next: S) {
        tracing::debug!(
            direction = self.direction,
            date = %self.date,
            from = ?self.state,
            to = ?next,
            "Sync run state change"
        );
        self.state = next;
    }
}

pub struct FederationSyncEngine {
    client: FederationGatewayClient,
    codec: Arc<dyn BatchCodec>,
    signer: Arc<dyn BatchSigner>,
    tags: Arc<dyn BatchTagSource>,
    partitions: PartitionLocks,
    max_pages: usize,
}

impl FederationSyncEngine {
    pub fn new(
        client: FederationGatewayClient,
        codec: Arc<dyn BatchCodec>,
        signer: Arc<dyn BatchSigner>,
        tags: Arc<dyn BatchTagSource>,
        max_pages: usize,
    ) -> Self {
        Self {
            client,
            codec,
            signer,
            tags,
            partitions: PartitionLocks::process(),
            max_pages: max_pages.max(1),
        }
    }

    /// Serialize through `partitions` instead of the process-wide locks
    pub fn with_partition_locks(mut self, partitions: PartitionLocks) -> Self {
        self.partitions = partitions;
        self
    }

    /// Upload the keys `collector` selects for `date` as one signed batch
    pub async fn upload(
        &self,
        date: NaiveDate,
        collector: &dyn KeyCollector,
    ) -> Result<UploadOutcome, SyncError> {
        let _partition = self.partitions.lock(date).await;
        let mut run = RunState::new("upload", date, UploadState::Idle);

        let result = self.run_upload(&mut run, collector).await;

        match &result {
            Ok(UploadOutcome::Uploaded {
                batch_tag,
                status,
                key_count,
            }) => {
                run.advance(UploadState::Succeeded);
                SYNC_RUNS_TOTAL
                    .with_label_values(&["upload", "succeeded"])
                    .inc();
                tracing::info!(
                    date = %date,
                    batch_tag = %batch_tag,
                    status = status.as_u16(),
                    key_count,
                    "Batch uploaded to federation gateway"
                );
            }
            Ok(UploadOutcome::NothingToUpload) => {
                run.advance(UploadState::Succeeded);
                SYNC_RUNS_TOTAL
                    .with_label_values(&["upload", "nothing_to_upload"])
                    .inc();
                tracing::info!(date = %date, "No keys eligible for upload");
            }
            Err(e) => {
                run.advance(UploadState::Failed);
                SYNC_RUNS_TOTAL.with_label_values(&["upload", "failed"]).inc();
                tracing::error!(date = %date, error = %e, "Federation upload failed");
            }
        }

        result
    }

    async fn run_upload(
        &self,
        run: &mut RunState<UploadState>,
        collector: &dyn KeyCollector,
    ) -> Result<UploadOutcome, SyncError> {
        run.advance(UploadState::Collecting);
        let keys = collector
            .collect(run.date)
            .await
            .map_err(SyncError::Collect)?;

        if keys.is_empty() {
            return Ok(UploadOutcome::NothingToUpload);
        }

        let batch = DiagnosisKeyBatch::new(self.tags.next_tag(run.date), self.codec.encode(&keys));
        let signature = self.signer.sign(batch.payload())?;

        run.advance(UploadState::Uploading);
        let status = self
            .client
            .upload(batch.tag(), &signature, batch.payload().clone())
            .await?;

        SYNC_UPLOAD_STATUS_TOTAL
            .with_label_values(&[status.as_str()])
            .inc();

        if !status.is_success() {
            return Err(SyncError::UploadRejected {
                batch_tag: batch.tag().clone(),
                status,
            });
        }

        Ok(UploadOutcome::Uploaded {
            batch_tag: batch.tag().clone(),
            status,
            key_count: keys.len(),
        })
    }

    /// Fetch every batch of the `date` partition and hand them to `inbox`
    pub async fn download(
        &self,
        date: NaiveDate,
        inbox: &dyn BatchInbox,
    ) -> Result<DownloadReport, SyncError> {
        let _partition = self.partitions.lock(date).await;
        let mut run = RunState::new("download", date, DownloadState::Idle);

        let result = self.run_download(&mut run, inbox).await;

        match &result {
            Ok(report) => {
                run.advance(DownloadState::Done);
                SYNC_RUNS_TOTAL.with_label_values(&["download", "done"]).inc();
                tracing::info!(
                    date = %date,
                    pages = report.pages_requested,
                    batches = report.batches_received,
                    keys = report.keys_received,
                    "Federation download completed"
                );
            }
            Err(e) => {
                run.advance(DownloadState::Failed);
                SYNC_RUNS_TOTAL
                    .with_label_values(&["download", "failed"])
                    .inc();
                tracing::error!(date = %date, error = %e, "Federation download failed");
            }
        }

        result
    }

    async fn run_download(
        &self,
        run: &mut RunState<DownloadState>,
        inbox: &dyn BatchInbox,
    ) -> Result<DownloadReport, SyncError> {
        let mut report = DownloadReport::default();
        let mut batches: Vec<ReceivedBatch> = Vec::new();
        let mut cursor: Option<BatchTag> = None;
        let mut seen: HashSet<BatchTag> = HashSet::new();

        run.advance(DownloadState::Fetching);
        loop {
            if report.pages_requested >= self.max_pages {
                return Err(SyncError::PageLimitExceeded(self.max_pages));
            }

            let page = self.client.download(run.date, cursor.as_ref()).await?;
            report.pages_requested += 1;

            if !page.status.is_success() {
                return Err(SyncError::UnexpectedStatus {
                    status: page.status,
                });
            }
            SYNC_PAGES_DOWNLOADED_TOTAL.inc();

            if page.body.is_empty() {
                break;
            }

            let keys = self.codec.decode(&page.body).map_err(|source| SyncError::Decode {
                page: report.pages_requested,
                source,
            })?;

            report.keys_received += keys.len();
            if page.batch_tag.is_some() {
                report.last_batch_tag = page.batch_tag.clone();
            }
            batches.push(ReceivedBatch {
                tag: page.batch_tag.clone(),
                payload: page.body,
                keys,
            });

            let Some(next) = page.next_batch_tag else {
                break;
            };

            // A cursor already requested, or pointing back at the page just
            // received, would never terminate.
            if page.batch_tag.as_ref() == Some(&next) || !seen.insert(next.clone()) {
                return Err(SyncError::RepeatedTag(next));
            }
            cursor = Some(next);
        }

        report.batches_received = batches.len();

        run.advance(DownloadState::Draining);
        if !batches.is_empty() {
            inbox
                .accept(run.date, batches)
                .await
                .map_err(SyncError::Inbox)?;
        }

        Ok(report)
    }
}

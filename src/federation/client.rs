// ============================================================================
// Federation Gateway Client
// ============================================================================
//
// Two endpoints of the federation gateway:
//
//   POST {base}/diagnosiskeys/upload
//        batchTag, batchSignature, Content-Type: application/protobuf; version=1.0
//
//   GET  {base}/diagnosiskeys/download/{date}
//        batchTag (optional cursor)
//
// The client is a thin request builder. Upload returns the gateway's status
// code as-is; download returns the raw body plus the tag headers. Retry and
// pagination policy belong to the sync engine.
//
// ============================================================================

use bytes::Bytes;
use chrono::NaiveDate;
use exposure_config::BATCH_CONTENT_TYPE;
use exposure_types::BatchTag;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderName};
use std::sync::Arc;

use crate::transport::{GatewayTransport, TransportError, TransportRequest};

pub const BATCH_TAG_HEADER: HeaderName = HeaderName::from_static("batchtag");
pub const BATCH_SIGNATURE_HEADER: HeaderName = HeaderName::from_static("batchsignature");
pub const NEXT_BATCH_TAG_HEADER: HeaderName = HeaderName::from_static("nextbatchtag");

/// One page of a download
#[derive(Debug, Clone)]
pub struct DownloadedPage {
    pub status: StatusCode,
    /// Tag of the batch in this page, if the gateway named it
    pub batch_tag: Option<BatchTag>,
    /// Cursor for the following page; absent on the last page
    pub next_batch_tag: Option<BatchTag>,
    pub body: Bytes,
}

#[derive(Clone)]
pub struct FederationGatewayClient {
    transport: Arc<dyn GatewayTransport>,
}

impl FederationGatewayClient {
    pub fn new(transport: Arc<dyn GatewayTransport>) -> Self {
        Self { transport }
    }

    /// Upload one signed batch. Returns the gateway's status code verbatim.
    pub async fn upload(
        &self,
        batch_tag: &BatchTag,
        batch_signature: &str,
        payload: Bytes,
    ) -> Result<StatusCode, TransportError> {
        tracing::info!(
            batch_tag = %batch_tag,
            payload_bytes = payload.len(),
            "Uploading batch to federation gateway"
        );

        let request = TransportRequest::post("/diagnosiskeys/upload", payload)
            .header(BATCH_TAG_HEADER, batch_tag.as_str())?
            .header(BATCH_SIGNATURE_HEADER, batch_signature)?
            .header(CONTENT_TYPE, BATCH_CONTENT_TYPE)?;

        let response = self.transport.send(request).await?;
        Ok(response.status)
    }

    /// Fetch one page of the `date` partition, continuing after `continuation`
    /// when given.
    pub async fn download(
        &self,
        date: NaiveDate,
        continuation: Option<&BatchTag>,
    ) -> Result<DownloadedPage, TransportError> {
        let mut request =
            TransportRequest::get(format!("/diagnosiskeys/download/{}", date.format("%Y-%m-%d")));
        if let Some(tag) = continuation {
            request = request.header(BATCH_TAG_HEADER, tag.as_str())?;
        }

        let response = self.transport.send(request).await?;

        let batch_tag = response
            .header_str(BATCH_TAG_HEADER.as_str())
            .and_then(BatchTag::from_header);
        let next_batch_tag = response
            .header_str(NEXT_BATCH_TAG_HEADER.as_str())
            .and_then(BatchTag::from_header);

        tracing::debug!(
            date = %date,
            status = response.status.as_u16(),
            batch_tag = ?batch_tag,
            next_batch_tag = ?next_batch_tag,
            body_bytes = response.body.len(),
            "Downloaded batch page"
        );

        Ok(DownloadedPage {
            status: response.status,
            batch_tag,
            next_batch_tag,
            body: response.body,
        })
    }
}

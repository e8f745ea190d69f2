// ============================================================================
// Federation Gateway Client Tests
// ============================================================================

use bytes::Bytes;
use exposure_server::FederationGatewayClient;
use exposure_server::transport::TransportError;
use exposure_types::BatchTag;
use reqwest::{Method, StatusCode};
use std::sync::Arc;

use test_utils::*;

#[tokio::test]
async fn test_upload_returns_raw_status() {
    // Multi-status is passed through for the caller to interpret
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(207)));
    let client = FederationGatewayClient::new(transport.clone());

    let status = client
        .upload(
            &BatchTag::new("20261018-1"),
            "c2lnbmF0dXJl",
            Bytes::from_static(b"payload"),
        )
        .await
        .unwrap();

    assert_eq!(status, StatusCode::MULTI_STATUS);

    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::POST);
    assert_eq!(request.path, "/diagnosiskeys/upload");
    assert_eq!(request.body.as_ref(), b"payload");
    assert_eq!(
        transport.request_header(0, "batchtag").as_deref(),
        Some("20261018-1")
    );
    assert_eq!(
        transport.request_header(0, "batchsignature").as_deref(),
        Some("c2lnbmF0dXJl")
    );
}

#[tokio::test]
async fn test_upload_rejects_unsendable_tag_without_calling() {
    let transport = Arc::new(ScriptedTransport::new());
    let client = FederationGatewayClient::new(transport.clone());

    let result = client
        .upload(&BatchTag::new("bad\ntag"), "sig", Bytes::new())
        .await;

    assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_download_without_cursor_sends_no_tag() {
    let transport = Arc::new(
        ScriptedTransport::new().reply(
            Reply::status(200)
                .header("batchtag", "b1")
                .header("nextbatchtag", "b2")
                .body(Bytes::from_static(b"raw batch")),
        ),
    );
    let client = FederationGatewayClient::new(transport.clone());

    let page = client.download(day(17), None).await.unwrap();

    assert_eq!(transport.requests()[0].method, Method::GET);
    assert_eq!(
        transport.requests()[0].path,
        "/diagnosiskeys/download/2026-10-17"
    );
    assert_eq!(transport.request_header(0, "batchtag"), None);

    // Body is returned undecoded
    assert_eq!(page.body.as_ref(), b"raw batch");
    assert_eq!(page.batch_tag, Some(BatchTag::new("b1")));
    assert_eq!(page.next_batch_tag, Some(BatchTag::new("b2")));
}

#[tokio::test]
async fn test_download_forwards_cursor() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(200)));
    let client = FederationGatewayClient::new(transport.clone());

    let page = client
        .download(day(17), Some(&BatchTag::new("b7")))
        .await
        .unwrap();

    assert_eq!(transport.request_header(0, "batchtag").as_deref(), Some("b7"));
    assert!(page.body.is_empty());
    assert_eq!(page.next_batch_tag, None);
}

#[tokio::test]
async fn test_download_propagates_timeout() {
    let transport = Arc::new(ScriptedTransport::new().timeout());
    let client = FederationGatewayClient::new(transport);

    let result = client.download(day(17), None).await;
    assert!(matches!(result, Err(TransportError::Timeout(_))));
}

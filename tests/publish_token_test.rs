// ============================================================================
// Publish Token Verification Tests
// ============================================================================
//
// Accepted / Rejected / Unavailable must never blur into each other:
// a failing verification service is not a wave of invalid tokens.
//
// ============================================================================

use chrono::NaiveDate;
use exposure_metrics::TOKEN_VERIFICATIONS_TOTAL;
use exposure_server::verification::{PublishTokenVerifier, VerificationError};
use exposure_types::{PublishToken, PublishTokenVerification, VerificationResult};
use std::sync::Arc;

use test_utils::*;

const TOKEN: &str = "123456789012";
const ACCEPTED_BODY: &str = r#"{"id":1,"symptomsOnset":"2021-01-01","symptomsExists":true}"#;

fn verifier(transport: &Arc<ScriptedTransport>) -> PublishTokenVerifier {
    PublishTokenVerifier::new(transport.clone())
}

#[tokio::test]
async fn test_accepted_token() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(200).body(ACCEPTED_BODY)));

    let result = verifier(&transport).verify(TOKEN).await.unwrap();

    assert_eq!(
        result,
        VerificationResult::Accepted(PublishTokenVerification {
            id: 1,
            symptoms_onset: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            symptoms_exists: Some(true),
        })
    );
}

#[tokio::test]
async fn test_request_carries_token_header() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(200).body(ACCEPTED_BODY)));

    verifier(&transport).verify(TOKEN).await.unwrap();

    assert_eq!(
        transport.request_header(0, "kv-publish-token").as_deref(),
        Some(TOKEN)
    );
    assert_eq!(
        transport.request_header(0, "accept").as_deref(),
        Some("application/json")
    );
    assert_eq!(transport.requests()[0].method, reqwest::Method::GET);
}

#[tokio::test]
async fn test_no_content_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(204)));

    let result = verifier(&transport).verify(TOKEN).await.unwrap();
    assert_eq!(result, VerificationResult::Rejected);
}

#[tokio::test]
async fn test_client_error_is_rejected() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(404).body("unknown token")));

    let result = verifier(&transport).verify(TOKEN).await.unwrap();
    assert_eq!(result, VerificationResult::Rejected);
}

#[tokio::test]
async fn test_server_error_is_unavailable_not_rejected() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(500)));

    let result = verifier(&transport).verify(TOKEN).await;
    assert!(matches!(
        result,
        Err(VerificationError::VerificationUnavailable(_))
    ));
}

#[tokio::test]
async fn test_timeout_is_unavailable() {
    let transport = Arc::new(ScriptedTransport::new().timeout());

    let result = verifier(&transport).verify(TOKEN).await;
    assert!(matches!(
        result,
        Err(VerificationError::VerificationUnavailable(_))
    ));
}

#[tokio::test]
async fn test_malformed_tokens_never_reach_the_network() {
    let transport = Arc::new(ScriptedTransport::new());
    let verifier = verifier(&transport);

    for token in ["", "12345", "1234567890123", "12345678901a", "１２３４５６７８９０１２", " 23456789012"] {
        let result = verifier.verify(token).await;
        assert!(
            matches!(result, Err(VerificationError::TokenSyntaxInvalid(_))),
            "token {:?} should fail syntax check",
            token
        );
    }
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_verify_and_record_persists_accepted() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(200).body(ACCEPTED_BODY)));
    let ledger = MemoryTokenLedger::new();

    let result = verifier(&transport)
        .verify_and_record(TOKEN, &ledger)
        .await
        .unwrap();

    assert!(result.is_accepted());
    assert_eq!(ledger.get(TOKEN).unwrap().id, 1);
}

#[tokio::test]
async fn test_verify_and_record_skips_rejected() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(403)));
    let ledger = MemoryTokenLedger::new();

    let result = verifier(&transport)
        .verify_and_record(TOKEN, &ledger)
        .await
        .unwrap();

    assert_eq!(result, VerificationResult::Rejected);
    assert!(ledger.get(TOKEN).is_none());
}

#[tokio::test]
async fn test_verify_and_record_counts_malformed_token() {
    let transport = Arc::new(ScriptedTransport::new());
    let ledger = MemoryTokenLedger::new();
    let invalid_syntax = TOKEN_VERIFICATIONS_TOTAL.with_label_values(&["invalid_syntax"]);
    let before = invalid_syntax.get();

    let result = verifier(&transport)
        .verify_and_record("12345678901x", &ledger)
        .await;

    assert!(matches!(result, Err(VerificationError::TokenSyntaxInvalid(_))));
    assert!(invalid_syntax.get() > before);
    assert_eq!(transport.request_count(), 0);
    assert!(ledger.get("12345678901x").is_none());
}

#[tokio::test]
async fn test_consume_removes_recorded_token_once() {
    let transport = Arc::new(ScriptedTransport::new().reply(Reply::status(200).body(ACCEPTED_BODY)));
    let ledger = MemoryTokenLedger::new();
    let verifier = verifier(&transport);
    let token = PublishToken::parse(TOKEN).unwrap();

    verifier.verify_and_record(TOKEN, &ledger).await.unwrap();

    assert!(verifier.consume(&token, &ledger).await.unwrap());
    assert!(!verifier.consume(&token, &ledger).await.unwrap());
}

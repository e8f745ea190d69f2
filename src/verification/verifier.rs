// ============================================================================
// Publish Token Verifier
// ============================================================================
//
// Checks a publish token against the remote verification service.
//
//   syntax invalid               -> TokenSyntaxInvalid (no network call)
//   2xx with JSON body           -> Accepted
//   2xx without body, any 4xx    -> Rejected
//   5xx, other codes, transport  -> VerificationUnavailable
//
// Rejected is a normal answer. Unavailable means "try again later" and must
// never be reported as a bad token.
//
// ============================================================================

use exposure_config::{PUBLISH_TOKEN_HEADER, VerificationConfig};
use exposure_metrics::TOKEN_VERIFICATIONS_TOTAL;
use exposure_types::{PublishToken, PublishTokenError, PublishTokenVerification, VerificationResult};
use reqwest::header::{ACCEPT, HeaderName};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::ledger::TokenLedger;
use crate::error::{CoreError, StoreError};
use crate::transport::{
    GatewayTransport, HttpTransport, TransportError, TransportRequest, TransportResponse,
};

const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("publish token syntax invalid: {0}")]
    TokenSyntaxInvalid(#[from] PublishTokenError),

    #[error("verification service unavailable: {0}")]
    VerificationUnavailable(String),

    #[error("token ledger failed: {0}")]
    Ledger(#[from] StoreError),
}

pub struct PublishTokenVerifier {
    transport: Arc<dyn GatewayTransport>,
}

impl PublishTokenVerifier {
    /// `transport` must be bound to the verification endpoint URL
    pub fn new(transport: Arc<dyn GatewayTransport>) -> Self {
        Self { transport }
    }

    /// Verifier talking HTTP to the configured verification service
    pub fn from_config(config: &VerificationConfig) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(
            "verification",
            &config.service_url,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(Self::new(Arc::new(transport)))
    }

    pub async fn verify(&self, raw_token: &str) -> Result<VerificationResult, VerificationError> {
        let token = parse_token(raw_token)?;
        self.verify_token(&token).await
    }

    /// Verify an already parsed token
    pub async fn verify_token(
        &self,
        token: &PublishToken,
    ) -> Result<VerificationResult, VerificationError> {
        let request = publish_token_header()
            .and_then(|name| TransportRequest::get("").header(name, token.expose()))
            .and_then(|r| r.header(ACCEPT, JSON_CONTENT_TYPE))
            .map_err(|e| VerificationError::VerificationUnavailable(e.to_string()))?;

        let outcome = match self.transport.send(request).await {
            Ok(response) => classify(response),
            Err(e) => Err(VerificationError::VerificationUnavailable(e.to_string())),
        };

        match &outcome {
            Ok(VerificationResult::Accepted(verification)) => {
                TOKEN_VERIFICATIONS_TOTAL
                    .with_label_values(&["accepted"])
                    .inc();
                tracing::info!(
                    token = %token,
                    verification_id = verification.id,
                    "Publish token accepted"
                );
            }
            Ok(VerificationResult::Rejected) => {
                TOKEN_VERIFICATIONS_TOTAL
                    .with_label_values(&["rejected"])
                    .inc();
                tracing::info!(token = %token, "Publish token rejected");
            }
            Err(e) => {
                TOKEN_VERIFICATIONS_TOTAL
                    .with_label_values(&["unavailable"])
                    .inc();
                tracing::warn!(token = %token, error = %e, "Publish token verification unavailable");
            }
        }

        outcome
    }

    /// Verify a token and record it in `ledger` when accepted
    pub async fn verify_and_record(
        &self,
        raw_token: &str,
        ledger: &dyn TokenLedger,
    ) -> Result<VerificationResult, VerificationError> {
        let token = parse_token(raw_token)?;
        let result = self.verify_token(&token).await?;

        if let VerificationResult::Accepted(verification) = &result {
            ledger.persist(&token, verification).await?;
        }

        Ok(result)
    }

    /// Remove a recorded token once its keys have been published.
    ///
    /// Returns `false` when the token was not (or no longer) recorded.
    pub async fn consume(
        &self,
        token: &PublishToken,
        ledger: &dyn TokenLedger,
    ) -> Result<bool, VerificationError> {
        let removed = ledger.delete(token).await?;
        if !removed {
            tracing::warn!(token = %token, "Consumed publish token was not recorded");
        }
        Ok(removed)
    }
}

/// Accepted verification, or `TokenRejected` for callers that treat a
/// rejected token as a failure
pub fn require_accepted(result: VerificationResult) -> Result<PublishTokenVerification, CoreError> {
    match result {
        VerificationResult::Accepted(verification) => Ok(verification),
        VerificationResult::Rejected => Err(CoreError::TokenRejected),
    }
}

fn parse_token(raw_token: &str) -> Result<PublishToken, VerificationError> {
    PublishToken::parse(raw_token).map_err(|e| {
        TOKEN_VERIFICATIONS_TOTAL
            .with_label_values(&["invalid_syntax"])
            .inc();
        tracing::debug!(error = %e, "Publish token failed syntax check");
        VerificationError::TokenSyntaxInvalid(e)
    })
}

fn publish_token_header() -> Result<HeaderName, TransportError> {
    HeaderName::from_bytes(PUBLISH_TOKEN_HEADER.as_bytes())
        .map_err(|e| TransportError::InvalidRequest(e.to_string()))
}

fn classify(response: TransportResponse) -> Result<VerificationResult, VerificationError> {
    let status = response.status;

    if status.is_success() {
        if response.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(VerificationResult::Rejected);
        }
        return serde_json::from_slice::<PublishTokenVerification>(&response.body)
            .map(VerificationResult::Accepted)
            .map_err(|e| {
                VerificationError::VerificationUnavailable(format!(
                    "unreadable verification response: {}",
                    e
                ))
            });
    }

    if status.is_client_error() {
        return Ok(VerificationResult::Rejected);
    }

    Err(VerificationError::VerificationUnavailable(format!(
        "verification service answered HTTP {}",
        status.as_u16()
    )))
}

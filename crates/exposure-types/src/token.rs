// ============================================================================
// Publish Tokens
// ============================================================================
//
// A publish token is a short numeric code handed to a person with a positive
// diagnosis. Before their keys are accepted the token is checked against the
// remote verification service.
//
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Publish tokens are exactly this many characters
pub const PUBLISH_TOKEN_LENGTH: usize = 12;

/// Structurally valid publish token.
///
/// `Debug` and `Display` print a masked form so a token never ends up in logs.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublishToken(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishTokenError {
    #[error("publish token must be {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("publish token contains a non-digit character at position {position}")]
    InvalidCharacter { position: usize },
}

impl PublishToken {
    /// Validate the token's syntax: fixed length, ASCII digits only
    pub fn parse(raw: &str) -> Result<Self, PublishTokenError> {
        let actual = raw.chars().count();
        if actual != PUBLISH_TOKEN_LENGTH {
            return Err(PublishTokenError::WrongLength {
                expected: PUBLISH_TOKEN_LENGTH,
                actual,
            });
        }

        if let Some(position) = raw.chars().position(|c| !c.is_ascii_digit()) {
            return Err(PublishTokenError::InvalidCharacter { position });
        }

        Ok(Self(raw.to_string()))
    }

    /// Full token value, for the verification header and the token ledger only
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four digits followed by asterisks
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(4).collect();
        format!("{}{}", visible, "*".repeat(self.0.len() - visible.len()))
    }
}

impl fmt::Debug for PublishToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublishToken").field(&self.masked()).finish()
    }
}

impl fmt::Display for PublishToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Body returned by the verification service for an accepted token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishTokenVerification {
    /// Correlation id assigned by the verification service
    pub id: i64,
    pub symptoms_onset: NaiveDate,
    #[serde(default)]
    pub symptoms_exists: Option<bool>,
}

/// Outcome of a completed verification exchange.
///
/// `Rejected` is a normal answer from the remote service, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Accepted(PublishTokenVerification),
    Rejected,
}

impl VerificationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, VerificationResult::Accepted(_))
    }

    pub fn verification(&self) -> Option<&PublishTokenVerification> {
        match self {
            VerificationResult::Accepted(verification) => Some(verification),
            VerificationResult::Rejected => None,
        }
    }
}

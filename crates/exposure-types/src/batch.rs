// ============================================================================
// Diagnosis Key Batches
// ============================================================================
//
// A batch is exchanged with the federation gateway as an opaque binary
// payload. The gateway orders batches of a day partition by their batch tag,
// which doubles as the download cursor.
//
// The protobuf messages below mirror the gateway batch schema; only the codec
// looks inside them.
//
// ============================================================================

use bytes::Bytes;
use std::fmt;

/// Header value the gateway sends instead of omitting `nextBatchTag`
const NULL_TAG: &str = "null";

/// Opaque cursor identifying a batch's position in the remote sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchTag(String);

impl BatchTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Parse a tag from a response header value.
    ///
    /// Empty values and the literal `null` mean "no tag".
    pub fn from_header(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(NULL_TAG) {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encoded batch ready to be uploaded, bound to the tag it is sent under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosisKeyBatch {
    tag: BatchTag,
    payload: Bytes,
}

impl DiagnosisKeyBatch {
    pub fn new(tag: BatchTag, payload: Bytes) -> Self {
        Self { tag, payload }
    }

    pub fn tag(&self) -> &BatchTag {
        &self.tag
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Batch downloaded from the gateway and decoded, waiting for ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedBatch {
    /// Tag the gateway declared for this page (absent on some gateways)
    pub tag: Option<BatchTag>,
    /// Raw bytes as received
    pub payload: Bytes,
    pub keys: Vec<DiagnosisKey>,
}

// ============================================================================
// Wire schema
// ============================================================================

#[derive(Clone, PartialEq, prost::Message)]
pub struct DiagnosisKeyBatchMessage {
    #[prost(message, repeated, tag = "1")]
    pub keys: Vec<DiagnosisKey>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DiagnosisKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key_data: Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub rolling_start_interval_number: u32,
    #[prost(uint32, tag = "3")]
    pub rolling_period: u32,
    #[prost(int32, tag = "4")]
    pub transmission_risk_level: i32,
    #[prost(string, repeated, tag = "5")]
    pub visited_countries: Vec<String>,
    #[prost(string, tag = "6")]
    pub origin: String,
    #[prost(enumeration = "ReportType", tag = "7")]
    pub report_type: i32,
    #[prost(sint32, tag = "8")]
    pub days_since_onset_of_symptoms: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ReportType {
    Unknown = 0,
    ConfirmedTest = 1,
    ConfirmedClinicalDiagnosis = 2,
    SelfReport = 3,
    Recursive = 4,
    Revoked = 5,
}

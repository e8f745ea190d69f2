// ============================================================================
// Batch Codec
// ============================================================================
//
// Wire encoding of diagnosis key batches exchanged with the gateway
// (`application/protobuf; version=1.0`).
//
// ============================================================================

use bytes::Bytes;
use exposure_types::{DiagnosisKey, DiagnosisKeyBatchMessage};
use prost::Message;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed batch payload: {0}")]
    Malformed(#[from] prost::DecodeError),
}

pub trait BatchCodec: Send + Sync {
    fn encode(&self, keys: &[DiagnosisKey]) -> Bytes;
    fn decode(&self, payload: &[u8]) -> Result<Vec<DiagnosisKey>, CodecError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ProtobufBatchCodec;

impl BatchCodec for ProtobufBatchCodec {
    fn encode(&self, keys: &[DiagnosisKey]) -> Bytes {
        let message = DiagnosisKeyBatchMessage {
            keys: keys.to_vec(),
        };
        Bytes::from(message.encode_to_vec())
    }

    fn decode(&self, payload: &[u8]) -> Result<Vec<DiagnosisKey>, CodecError> {
        Ok(DiagnosisKeyBatchMessage::decode(payload)?.keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exposure_types::ReportType;

    fn key(byte: u8) -> DiagnosisKey {
        DiagnosisKey {
            key_data: vec![byte; 16],
            rolling_start_interval_number: 2_890_080,
            rolling_period: 144,
            transmission_risk_level: 3,
            visited_countries: vec!["DE".into(), "FI".into()],
            origin: "FI".into(),
            report_type: ReportType::ConfirmedTest as i32,
            days_since_onset_of_symptoms: -2,
        }
    }

    #[test]
    fn test_encoded_batch_decodes_to_same_keys() {
        let keys = vec![key(1), key(2)];
        let payload = ProtobufBatchCodec.encode(&keys);

        assert_eq!(ProtobufBatchCodec.decode(&payload).unwrap(), keys);
    }

    #[test]
    fn test_garbage_payload_rejected() {
        let result = ProtobufBatchCodec.decode(&[0xff, 0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(CodecError::Malformed(_))));
    }
}

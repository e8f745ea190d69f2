// ============================================================================
// Exposure Configuration
// ============================================================================
//
// Versioned risk-scoring parameters served to client applications.
// A configuration is immutable once built; a newer one is published with a
// higher version instead of editing an existing row.
//
// ============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of buckets in every score array (exposure notification standard)
pub const SCORE_BUCKET_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExposureConfiguration {
    /// Monotonically increasing version, the ordering key for "latest"
    pub version: i64,
    pub minimum_risk_score: i32,
    pub attenuation_scores: Vec<i32>,
    pub days_since_last_exposure_scores: Vec<i32>,
    pub duration_scores: Vec<i32>,
    pub transmission_risk_scores: Vec<i32>,
    pub duration_at_attenuation_thresholds: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationShapeError {
    #[error("{field} must contain {expected} values, got {actual}")]
    WrongBucketCount {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ExposureConfiguration {
    /// Check the fixed bucket count of the score arrays.
    ///
    /// The store that produces rows owns this invariant; the helper exists so a
    /// publisher can reject a malformed row before it is written.
    pub fn validate(&self) -> Result<(), ConfigurationShapeError> {
        let arrays: [(&'static str, &Vec<i32>); 4] = [
            ("attenuationScores", &self.attenuation_scores),
            ("daysSinceLastExposureScores", &self.days_since_last_exposure_scores),
            ("durationScores", &self.duration_scores),
            ("transmissionRiskScores", &self.transmission_risk_scores),
        ];

        for (field, values) in arrays {
            if values.len() != SCORE_BUCKET_COUNT {
                return Err(ConfigurationShapeError::WrongBucketCount {
                    field,
                    expected: SCORE_BUCKET_COUNT,
                    actual: values.len(),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExposureConfiguration {
        ExposureConfiguration {
            version: 3,
            minimum_risk_score: 11,
            attenuation_scores: vec![1, 2, 3, 4, 5, 6, 7, 8],
            days_since_last_exposure_scores: vec![8, 7, 6, 5, 4, 3, 2, 1],
            duration_scores: vec![1; 8],
            transmission_risk_scores: vec![2; 8],
            duration_at_attenuation_thresholds: vec![50, 70],
        }
    }

    #[test]
    fn test_validate_accepts_eight_buckets() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_array() {
        let mut config = sample();
        config.duration_scores.pop();

        let err = config.validate().unwrap_err();
        assert_eq!(
            err,
            ConfigurationShapeError::WrongBucketCount {
                field: "durationScores",
                expected: 8,
                actual: 7,
            }
        );
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["minimumRiskScore"], 11);
        assert_eq!(json["durationAtAttenuationThresholds"][1], 70);
    }
}

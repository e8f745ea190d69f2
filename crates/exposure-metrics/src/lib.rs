//! Prometheus metrics for the exposure federation server
//!
//! Provides centralized metrics collection for monitoring:
//! - Configuration store fetches
//! - Federation sync runs (upload / download)
//! - Publish token verification outcomes
//! - Outbound transport latency

use anyhow::Result;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, TextEncoder, opts, register_histogram_vec,
    register_int_counter, register_int_counter_vec,
};

// ============================================================================
// Configuration Cache Metrics
// ============================================================================

/// Store fetches issued by the configuration cache (by outcome)
pub static CONFIG_STORE_FETCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "exposure_config_store_fetches_total",
            "Configuration store fetches issued by the cache"
        ),
        &["outcome"]
    )
    .expect("Failed to register CONFIG_STORE_FETCHES_TOTAL metric")
});

// ============================================================================
// Federation Sync Metrics
// ============================================================================

/// Sync runs by direction ("upload" / "download") and outcome
pub static SYNC_RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "exposure_federation_sync_runs_total",
            "Federation sync runs by direction and outcome"
        ),
        &["direction", "outcome"]
    )
    .expect("Failed to register SYNC_RUNS_TOTAL metric")
});

/// Pages fetched from the gateway during download runs
pub static SYNC_PAGES_DOWNLOADED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(opts!(
        "exposure_federation_pages_downloaded_total",
        "Batch pages fetched from the federation gateway"
    ))
    .expect("Failed to register SYNC_PAGES_DOWNLOADED_TOTAL metric")
});

/// Upload responses by status code
pub static SYNC_UPLOAD_STATUS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "exposure_federation_upload_status_total",
            "Federation gateway upload responses by status code"
        ),
        &["status_code"]
    )
    .expect("Failed to register SYNC_UPLOAD_STATUS_TOTAL metric")
});

// ============================================================================
// Token Verification Metrics
// ============================================================================

/// Verification outcomes ("accepted", "rejected", "invalid_syntax", "unavailable")
pub static TOKEN_VERIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        opts!(
            "exposure_token_verifications_total",
            "Publish token verifications by outcome"
        ),
        &["outcome"]
    )
    .expect("Failed to register TOKEN_VERIFICATIONS_TOTAL metric")
});

// ============================================================================
// Transport Metrics
// ============================================================================

/// Outbound request duration in seconds (by remote)
pub static TRANSPORT_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "exposure_transport_request_duration_seconds",
        "Outbound request duration in seconds",
        &["remote"]
    )
    .expect("Failed to register TRANSPORT_REQUEST_DURATION_SECONDS metric")
});

// ============================================================================
// Metrics Collection
// ============================================================================

/// Gather all registered metrics and encode as Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode(&metric_families, &mut buffer)?;

    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gather_metrics() {
        TOKEN_VERIFICATIONS_TOTAL
            .with_label_values(&["accepted"])
            .inc();
        SYNC_PAGES_DOWNLOADED_TOTAL.inc();

        let metrics_text = gather_metrics().unwrap();
        assert!(metrics_text.contains("exposure_token_verifications_total"));
        assert!(metrics_text.contains("exposure_federation_pages_downloaded_total"));
    }
}

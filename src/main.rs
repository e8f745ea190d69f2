// ============================================================================
// Exposure Sync - Federation Download Runner
// ============================================================================
//
// Downloads every batch the federation gateway holds for one day and stores
// them for ingestion.
//
// Usage: exposure-sync [YYYY-MM-DD]     (default: yesterday, UTC)
//
// Meant to be invoked by an external scheduler; a failed run exits non-zero
// and the scheduler decides whether to retry.
//
// ============================================================================

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use exposure_config::{Config, LogFormat, LoggingConfig};
use exposure_metrics::gather_metrics;
use exposure_server::db::{self, PgBatchInbox};
use exposure_server::federation::{
    Ed25519BatchSigner, FederationGatewayClient, FederationSyncEngine, ProtobufBatchCodec,
    UuidBatchTagSource,
};
use exposure_server::transport::HttpTransport;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.logging);

    info!("=== Exposure Sync Starting ===");

    if !config.federation.enabled {
        warn!("Federation is DISABLED. Set FEDERATION_ENABLED=true to synchronize with the gateway.");
        return Ok(());
    }

    let date = partition_date(std::env::args().nth(1).as_deref())?;
    info!(date = %date, gateway = %config.federation.gateway_url, "Synchronizing partition");

    let seed = config
        .federation
        .signing_key_seed
        .as_deref()
        .context("FEDERATION_SIGNING_KEY is required when federation is enabled")?;
    let signer = Ed25519BatchSigner::from_seed_base64(seed)?;

    let transport = HttpTransport::with_mtls(
        "gateway",
        &config.federation.gateway_url,
        Duration::from_secs(config.federation.timeout_secs),
        &config.federation.mtls,
    )?;

    let engine = FederationSyncEngine::new(
        FederationGatewayClient::new(Arc::new(transport)),
        Arc::new(ProtobufBatchCodec),
        Arc::new(signer),
        Arc::new(UuidBatchTagSource),
        config.federation.max_pages,
    );

    let pool = db::create_pool(&config.database_url, &config.db).await?;
    info!("Connected to database");

    let inbox = PgBatchInbox::new(pool);
    let result = engine.download(date, &inbox).await;

    // One-shot process: metrics go to the log
    report_metrics();
    let report = result?;

    info!(
        date = %date,
        pages = report.pages_requested,
        batches = report.batches_received,
        keys = report.keys_received,
        "=== Exposure Sync Finished ==="
    );
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&logging.rust_log));

    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn report_metrics() {
    match gather_metrics() {
        Ok(text) => debug!(metrics = %text, "Run metrics"),
        Err(e) => warn!(error = %e, "Failed to gather metrics"),
    }
}

fn partition_date(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .with_context(|| format!("Invalid partition date '{}', expected YYYY-MM-DD", raw)),
        None => Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .context("Cannot compute yesterday's date"),
    }
}

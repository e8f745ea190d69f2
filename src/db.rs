// ============================================================================
// Postgres Collaborators
// ============================================================================
//
// Tables read and written here:
//
//   exposure_configuration       version, minimum_risk_score, *_scores INT[],
//                                duration_at_attenuation_thresholds INT[]
//   publish_tokens               token PK, verification_id, symptoms_onset,
//                                symptoms_exists, created_at
//   federation_received_batches  batch_tag, partition_date, payload, key_count,
//                                received_at
//
// ============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use exposure_config::DbConfig;
use exposure_types::{
    ExposureConfiguration, PublishToken, PublishTokenVerification, ReceivedBatch,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

use crate::configuration::ConfigStore;
use crate::error::StoreError;
use crate::federation::BatchInbox;
use crate::verification::TokenLedger;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str, config: &DbConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(database_url)
        .await
        .context("Failed to connect to Postgres")?;
    Ok(pool)
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ConfigurationRow {
    version: i64,
    minimum_risk_score: i32,
    attenuation_scores: Vec<i32>,
    days_since_last_exposure_scores: Vec<i32>,
    duration_scores: Vec<i32>,
    transmission_risk_scores: Vec<i32>,
    duration_at_attenuation_thresholds: Vec<i32>,
}

impl From<ConfigurationRow> for ExposureConfiguration {
    fn from(row: ConfigurationRow) -> Self {
        ExposureConfiguration {
            version: row.version,
            minimum_risk_score: row.minimum_risk_score,
            attenuation_scores: row.attenuation_scores,
            days_since_last_exposure_scores: row.days_since_last_exposure_scores,
            duration_scores: row.duration_scores,
            transmission_risk_scores: row.transmission_risk_scores,
            duration_at_attenuation_thresholds: row.duration_at_attenuation_thresholds,
        }
    }
}

#[derive(Clone)]
pub struct PgConfigStore {
    pool: DbPool,
}

impl PgConfigStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn fetch_latest(&self) -> Result<Option<ExposureConfiguration>, StoreError> {
        let row = sqlx::query_as::<_, ConfigurationRow>(
            r#"
            SELECT version, minimum_risk_score,
                   attenuation_scores, days_since_last_exposure_scores,
                   duration_scores, transmission_risk_scores,
                   duration_at_attenuation_thresholds
            FROM exposure_configuration
            ORDER BY version DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ExposureConfiguration::from))
    }
}

#[derive(Clone)]
pub struct PgTokenLedger {
    pool: DbPool,
}

impl PgTokenLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenLedger for PgTokenLedger {
    async fn persist(
        &self,
        token: &PublishToken,
        verification: &PublishTokenVerification,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO publish_tokens (token, verification_id, symptoms_onset, symptoms_exists, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (token) DO UPDATE
            SET verification_id = EXCLUDED.verification_id,
                symptoms_onset = EXCLUDED.symptoms_onset,
                symptoms_exists = EXCLUDED.symptoms_exists
            "#,
        )
        .bind(token.expose())
        .bind(verification.id)
        .bind(verification.symptoms_onset)
        .bind(verification.symptoms_exists)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, token: &PublishToken) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM publish_tokens WHERE token = $1")
            .bind(token.expose())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Stores every batch of a completed download run in one transaction
#[derive(Clone)]
pub struct PgBatchInbox {
    pool: DbPool,
}

impl PgBatchInbox {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BatchInbox for PgBatchInbox {
    async fn accept(&self, date: NaiveDate, batches: Vec<ReceivedBatch>) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for batch in &batches {
            sqlx::query(
                r#"
                INSERT INTO federation_received_batches
                    (batch_tag, partition_date, payload, key_count, received_at)
                VALUES ($1, $2, $3, $4, NOW())
                ON CONFLICT (batch_tag) DO NOTHING
                "#,
            )
            .bind(batch.tag.as_ref().map(|t| t.as_str()))
            .bind(date)
            .bind(batch.payload.as_ref())
            .bind(batch.keys.len() as i32)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to store batch {:?}", batch.tag))?;
        }

        tx.commit().await?;

        tracing::info!(
            date = %date,
            batches = batches.len(),
            "Received batches stored for ingestion"
        );
        Ok(())
    }
}

//! Local cache of the provider's voice catalog

use chrono::Utc;
use log::info;
use sqlx::sqlite::SqlitePool;

use crate::constants::UNKNOWN_VOICE_NAME;
use crate::error::AppError;
use crate::gateway::SynthesisGateway;
use crate::models::Voice;
use crate::queries::{stats, voices};

/// Fetch the live catalog and write every voice through to the cache.
///
/// Existing rows get their display fields overwritten; new voices also get a
/// zeroed usage counter.
pub async fn refresh_catalog(
    pool: &SqlitePool,
    gateway: &SynthesisGateway,
) -> Result<Vec<Voice>, AppError> {
    let catalog = gateway.list_voices().await?;
    let now_ms = Utc::now().timestamp_millis();

    let mut tx = pool.begin().await?;
    for voice in &catalog {
        sqlx::query(&voices::upsert(voice, now_ms))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&stats::seed_voice_usage(&voice.id))
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await?;

    info!("Voice catalog refreshed: {} voices", catalog.len());
    Ok(catalog)
}

pub async fn get_voice(pool: &SqlitePool, id: &str) -> Result<Option<Voice>, sqlx::Error> {
    let sql = voices::select_by_id(id);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    row.as_ref().map(Voice::from_row).transpose()
}

/// Cached voices ordered by name
pub async fn list_cached(pool: &SqlitePool) -> Result<Vec<Voice>, sqlx::Error> {
    let sql = voices::select_all();
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(Voice::from_row).collect()
}

/// Display name to snapshot onto a new record
pub async fn snapshot_name(pool: &SqlitePool, id: &str) -> Result<String, sqlx::Error> {
    Ok(get_voice(pool, id)
        .await?
        .map(|v| v.name)
        .unwrap_or_else(|| UNKNOWN_VOICE_NAME.to_string()))
}

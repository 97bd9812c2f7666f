//! Generation record store
//!
//! Persists the parameters of every successful synthesis. Performs no
//! authorization; callers check ownership before `delete`.

use chrono::Utc;
use sqlx::sqlite::SqlitePool;

use crate::constants::MAX_LIST_LIMIT;
use crate::error::AppError;
use crate::models::{GenerationRecord, NewGeneration};
use crate::queries::generations;

/// Clamp a caller supplied list limit to `[1, MAX_LIST_LIMIT]`
pub fn clamp_limit(requested: Option<u64>, default: u64) -> u64 {
    requested.unwrap_or(default).clamp(1, MAX_LIST_LIMIT)
}

/// Persist a new record, assigning id and creation time
pub async fn create(pool: &SqlitePool, new: &NewGeneration) -> Result<GenerationRecord, AppError> {
    if new.params.text().is_empty() || new.params.voice_id().is_empty() {
        return Err(AppError::Validation(
            "text and voiceId are required".to_string(),
        ));
    }

    let sql = generations::insert(
        new.params.text(),
        new.params.voice_id(),
        &new.voice_name,
        new.params.stability(),
        new.params.clarity(),
        &new.format,
        new.duration,
        new.owner_id,
        Utc::now().timestamp_millis(),
    );
    let id = sqlx::query(&sql).execute(pool).await?.last_insert_rowid();

    get(pool, id).await
}

/// Fetch one record or `NotFound`
pub async fn get(pool: &SqlitePool, id: i64) -> Result<GenerationRecord, AppError> {
    find(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Generation {}", id)))
}

pub async fn find(pool: &SqlitePool, id: i64) -> Result<Option<GenerationRecord>, sqlx::Error> {
    let sql = generations::select_by_id(id);
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    row.as_ref().map(GenerationRecord::from_row).transpose()
}

/// Newest first, across all owners
pub async fn list_recent(pool: &SqlitePool, limit: u64) -> Result<Vec<GenerationRecord>, sqlx::Error> {
    let sql = generations::select_recent(limit);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(GenerationRecord::from_row).collect()
}

/// Newest first, one owner only
pub async fn list_for_owner(
    pool: &SqlitePool,
    owner_id: i64,
    limit: u64,
) -> Result<Vec<GenerationRecord>, sqlx::Error> {
    let sql = generations::select_by_owner(owner_id, limit);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(GenerationRecord::from_row).collect()
}

/// Bump the download counter by exactly one in a single UPDATE
///
/// Not idempotent: every call counts.
pub async fn increment_download_count(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let sql = generations::increment_download_count(id);
    let result = sqlx::query(&sql).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Generation {}", id)));
    }
    Ok(())
}

/// Hard delete. Returns `NotFound` when nothing was removed.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<(), AppError> {
    let sql = generations::delete_by_id(id);
    let result = sqlx::query(&sql).execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("Generation {}", id)));
    }
    Ok(())
}

//! Statistics aggregator: per-user daily rollups, lifetime counters and voice usage
//!
//! Everything here is best-effort telemetry from the caller's point of view;
//! the regeneration service logs and swallows failures.

use chrono::{Datelike, Duration, NaiveDate, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

use crate::constants::{POPULAR_VOICES_LIMIT, RECENT_ACTIVITY_DAYS};
use crate::models::{PopularVoice, User, UserDailyStats, UserStatsSummary, VoiceUsageStats};
use crate::queries::{stats, users};

/// Calendar day key (UTC) used by the daily rollup
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Add one generation to today's rollup and to the user's lifetime counter
pub async fn record_generation(
    pool: &SqlitePool,
    owner_id: i64,
    characters: i64,
    duration_seconds: f64,
) -> Result<(), sqlx::Error> {
    record_generation_on(pool, owner_id, today(), characters, duration_seconds).await
}

/// Same as `record_generation` for an explicit day
pub async fn record_generation_on(
    pool: &SqlitePool,
    owner_id: i64,
    day: NaiveDate,
    characters: i64,
    duration_seconds: f64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(&stats::upsert_daily(
        owner_id,
        &day_key(day),
        characters,
        duration_seconds,
    ))
    .execute(&mut *tx)
    .await?;
    sqlx::query(&users::increment_total_generations(owner_id))
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}

/// One more use of `voice_id`, regardless of who generated
pub async fn record_voice_usage(pool: &SqlitePool, voice_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(&stats::increment_voice_usage(voice_id))
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn daily(
    pool: &SqlitePool,
    user_id: i64,
    day: NaiveDate,
) -> Result<Option<UserDailyStats>, sqlx::Error> {
    let sql = stats::select_daily(user_id, &day_key(day));
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    row.as_ref().map(UserDailyStats::from_row).transpose()
}

pub async fn voice_usage(pool: &SqlitePool, voice_id: &str) -> Result<i64, sqlx::Error> {
    let sql = stats::select_voice_usage(voice_id);
    let count: Option<i64> = sqlx::query_scalar(&sql).fetch_optional(pool).await?;
    Ok(count.unwrap_or(0))
}

/// All voice counters, most used first
pub async fn voice_usage_list(pool: &SqlitePool) -> Result<Vec<VoiceUsageStats>, sqlx::Error> {
    let sql = stats::select_all_voice_usage();
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter()
        .map(|row| {
            Ok(VoiceUsageStats {
                voice_id: row.try_get("voice_id")?,
                voice_name: row.try_get("name")?,
                use_count: row.try_get("use_count")?,
            })
        })
        .collect()
}

/// Lifetime and recent activity rollup for one user
pub async fn user_summary(pool: &SqlitePool, user: &User) -> Result<UserStatsSummary, sqlx::Error> {
    user_summary_on(pool, user, today()).await
}

pub async fn user_summary_on(
    pool: &SqlitePool,
    user: &User,
    today: NaiveDate,
) -> Result<UserStatsSummary, sqlx::Error> {
    let totals = sqlx::query(&stats::select_lifetime_totals(user.id))
        .fetch_one(pool)
        .await?;
    let total_characters: i64 = totals.try_get(0)?;
    let total_duration: f64 = totals.try_get(1)?;

    let total_downloads: i64 = sqlx::query_scalar(&stats::select_total_downloads(user.id))
        .fetch_one(pool)
        .await?;

    let since = today - Duration::days(RECENT_ACTIVITY_DAYS - 1);
    let recent_activity = sqlx::query(&stats::select_daily_since(user.id, &day_key(since)))
        .fetch_all(pool)
        .await?
        .iter()
        .map(UserDailyStats::from_row)
        .collect::<Result<Vec<_>, _>>()?;

    let popular_voices = sqlx::query(&stats::select_popular_voices(user.id, POPULAR_VOICES_LIMIT))
        .fetch_all(pool)
        .await?
        .iter()
        .map(|row| {
            Ok(PopularVoice {
                voice_id: row.try_get("voice_id")?,
                name: row.try_get("voice_name")?,
                count: row.try_get("use_count")?,
            })
        })
        .collect::<Result<Vec<_>, sqlx::Error>>()?;

    let month_start = today.with_day(1).unwrap_or(today);
    let used_quota: i64 =
        sqlx::query_scalar(&stats::select_generation_count_since(user.id, &day_key(month_start)))
            .fetch_one(pool)
            .await?;

    Ok(UserStatsSummary {
        total_generations: user.total_generations,
        total_characters,
        total_duration: (total_duration * 100.0).round() / 100.0,
        total_downloads,
        recent_activity,
        popular_voices,
        monthly_quota: user.monthly_quota,
        used_quota,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_key_format() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(day_key(d), "2024-03-07");
    }
}

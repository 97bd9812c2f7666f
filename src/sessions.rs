//! Server side login sessions keyed by an opaque cookie token

use chrono::{Duration, Utc};
use log::debug;
use sqlx::sqlite::SqlitePool;

use crate::constants::generate_session_token;
use crate::queries::sessions;

/// Issue a new session for `user_id`, returning its token
pub async fn create(pool: &SqlitePool, user_id: i64, ttl: Duration) -> Result<String, sqlx::Error> {
    let token = generate_session_token();
    let now = Utc::now();
    let sql = sessions::insert(
        &token,
        user_id,
        now.timestamp_millis(),
        (now + ttl).timestamp_millis(),
    );
    sqlx::query(&sql).execute(pool).await?;
    debug!("Session created for user {}", user_id);
    Ok(token)
}

/// User id behind a live (unexpired) token
pub async fn resolve(pool: &SqlitePool, token: &str) -> Result<Option<i64>, sqlx::Error> {
    let sql = sessions::select_live_user_id(token, Utc::now().timestamp_millis());
    sqlx::query_scalar(&sql).fetch_optional(pool).await
}

pub async fn delete(pool: &SqlitePool, token: &str) -> Result<(), sqlx::Error> {
    sqlx::query(&sessions::delete_by_token(token))
        .execute(pool)
        .await?;
    Ok(())
}

/// Drop expired rows; returns how many were removed
pub async fn purge_expired(pool: &SqlitePool) -> Result<u64, sqlx::Error> {
    let sql = sessions::delete_expired(Utc::now().timestamp_millis());
    Ok(sqlx::query(&sql).execute(pool).await?.rows_affected())
}

//! SQLite pool setup and schema bootstrap
//!
//! Statements come from `crate::queries`; this module only owns connection
//! options, schema creation and the version handshake.

use log::info;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Row, Sqlite};
use std::path::Path;
use std::time::Duration;

use crate::constants::EXPECTED_DB_VERSION;
use crate::queries::{ddl, metadata};

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Open a bounded connection pool, creating the database file if needed
/// Enables WAL mode and foreign keys on every connection
pub async fn open_pool(
    db_path: &Path,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<SqlitePool, DynError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await?;

    info!(
        "SQLite database: {} (max {} connections)",
        db_path.display(),
        max_connections
    );
    Ok(pool)
}

/// Create tables and indexes if they don't exist, then stamp or verify the schema version
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), DynError> {
    for sql in [
        ddl::create_metadata_table(),
        ddl::create_users_table(),
        ddl::create_sessions_table(),
        ddl::create_voices_table(),
        ddl::create_audio_generations_table(),
        ddl::create_user_daily_stats_table(),
        ddl::create_voice_usage_stats_table(),
        ddl::create_generations_created_at_index(),
        ddl::create_generations_owner_index(),
        ddl::create_sessions_user_index(),
    ] {
        sqlx::query(&sql).execute(pool).await?;
    }

    match query_metadata(pool, "version").await? {
        Some(version) if version != EXPECTED_DB_VERSION => Err(format!(
            "Unsupported database version: '{}'. This application only supports version '{}'",
            version, EXPECTED_DB_VERSION
        )
        .into()),
        Some(_) => Ok(()),
        None => {
            insert_metadata(pool, "version", EXPECTED_DB_VERSION).await?;
            Ok(())
        }
    }
}

/// Query a single metadata value by key
pub async fn query_metadata<'e, E>(executor: E, key: &str) -> Result<Option<String>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = metadata::select_by_key(key);
    let row = sqlx::query(&sql).fetch_optional(executor).await?;
    row.map(|r| r.try_get::<String, _>(0)).transpose()
}

/// Insert a new metadata key-value pair
pub async fn insert_metadata<'e, E>(executor: E, key: &str, value: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = metadata::insert(key, value);
    sqlx::query(&sql).execute(executor).await?;
    Ok(())
}

/// Create a pool over a fresh database file in a temporary directory, schema included.
/// The returned `TempDir` must outlive the pool.
pub async fn create_test_connection_in_temporary_file() -> (SqlitePool, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("test.sqlite");
    let pool = open_pool(&path, 5, Duration::from_secs(5))
        .await
        .expect("Failed to open test database");
    init_database_schema(&pool)
        .await
        .expect("Failed to initialize test schema");
    (pool, dir)
}

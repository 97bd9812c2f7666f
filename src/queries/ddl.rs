use sea_query::{ColumnDef, ForeignKey, ForeignKeyAction, Index, SqliteQueryBuilder, Table};

use crate::schema::{
    AudioGenerations, Metadata, Sessions, UserDailyStats, Users, VoiceUsageStats, Voices,
};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS users (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     username TEXT NOT NULL UNIQUE,
///     email TEXT NOT NULL UNIQUE,
///     password TEXT NOT NULL,
///     full_name TEXT, avatar_url TEXT,
///     total_generations INTEGER NOT NULL DEFAULT 0,
///     monthly_quota INTEGER NOT NULL,
///     created_at_ms INTEGER NOT NULL,
///     last_login_at_ms INTEGER
/// )
pub fn create_users_table() -> String {
    Table::create()
        .table(Users::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(Users::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(Users::Username).text().not_null().unique_key())
        .col(ColumnDef::new(Users::Email).text().not_null().unique_key())
        .col(ColumnDef::new(Users::Password).text().not_null())
        .col(ColumnDef::new(Users::FullName).text())
        .col(ColumnDef::new(Users::AvatarUrl).text())
        .col(
            ColumnDef::new(Users::TotalGenerations)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(ColumnDef::new(Users::MonthlyQuota).big_integer().not_null())
        .col(ColumnDef::new(Users::CreatedAtMs).big_integer().not_null())
        .col(ColumnDef::new(Users::LastLoginAtMs).big_integer())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS sessions (
///     token TEXT PRIMARY KEY,
///     user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at_ms INTEGER NOT NULL,
///     expires_at_ms INTEGER NOT NULL
/// )
pub fn create_sessions_table() -> String {
    Table::create()
        .table(Sessions::Table)
        .if_not_exists()
        .col(ColumnDef::new(Sessions::Token).text().primary_key())
        .col(ColumnDef::new(Sessions::UserId).big_integer().not_null())
        .col(ColumnDef::new(Sessions::CreatedAtMs).big_integer().not_null())
        .col(ColumnDef::new(Sessions::ExpiresAtMs).big_integer().not_null())
        .foreign_key(
            ForeignKey::create()
                .from(Sessions::Table, Sessions::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS voices (id TEXT PRIMARY KEY, name TEXT NOT NULL, ...)
pub fn create_voices_table() -> String {
    Table::create()
        .table(Voices::Table)
        .if_not_exists()
        .col(ColumnDef::new(Voices::Id).text().primary_key())
        .col(ColumnDef::new(Voices::Name).text().not_null())
        .col(ColumnDef::new(Voices::Description).text())
        .col(ColumnDef::new(Voices::Language).text())
        .col(ColumnDef::new(Voices::Category).text())
        .col(
            ColumnDef::new(Voices::Premium)
                .boolean()
                .not_null()
                .default(false),
        )
        .col(ColumnDef::new(Voices::Gender).text())
        .col(ColumnDef::new(Voices::Accent).text())
        .col(ColumnDef::new(Voices::Age).text())
        .col(ColumnDef::new(Voices::UseCase).text())
        .col(ColumnDef::new(Voices::UpdatedAtMs).big_integer().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS audio_generations (
///     id INTEGER PRIMARY KEY AUTOINCREMENT,
///     text TEXT NOT NULL,
///     voice_id TEXT NOT NULL,
///     voice_name TEXT NOT NULL,
///     stability INTEGER NOT NULL DEFAULT 50,
///     clarity INTEGER NOT NULL DEFAULT 70,
///     format TEXT NOT NULL DEFAULT 'mp3',
///     audio_url TEXT NOT NULL DEFAULT '',
///     duration_seconds REAL NOT NULL DEFAULT 0,
///     download_count INTEGER NOT NULL DEFAULT 0,
///     owner_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
///     created_at_ms INTEGER NOT NULL
/// )
pub fn create_audio_generations_table() -> String {
    Table::create()
        .table(AudioGenerations::Table)
        .if_not_exists()
        .col(
            ColumnDef::new(AudioGenerations::Id)
                .integer()
                .primary_key()
                .auto_increment(),
        )
        .col(ColumnDef::new(AudioGenerations::Text).text().not_null())
        .col(ColumnDef::new(AudioGenerations::VoiceId).text().not_null())
        .col(ColumnDef::new(AudioGenerations::VoiceName).text().not_null())
        .col(
            ColumnDef::new(AudioGenerations::Stability)
                .big_integer()
                .not_null()
                .default(50),
        )
        .col(
            ColumnDef::new(AudioGenerations::Clarity)
                .big_integer()
                .not_null()
                .default(70),
        )
        .col(
            ColumnDef::new(AudioGenerations::Format)
                .text()
                .not_null()
                .default("mp3"),
        )
        // Placeholder only, audio bytes are regenerated on demand
        .col(
            ColumnDef::new(AudioGenerations::AudioUrl)
                .text()
                .not_null()
                .default(""),
        )
        .col(
            ColumnDef::new(AudioGenerations::DurationSeconds)
                .double()
                .not_null()
                .default(0.0),
        )
        .col(
            ColumnDef::new(AudioGenerations::DownloadCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(ColumnDef::new(AudioGenerations::OwnerId).big_integer())
        .col(
            ColumnDef::new(AudioGenerations::CreatedAtMs)
                .big_integer()
                .not_null(),
        )
        .foreign_key(
            ForeignKey::create()
                .from(AudioGenerations::Table, AudioGenerations::OwnerId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::SetNull),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS user_daily_stats (
///     user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     day TEXT NOT NULL,
///     generation_count INTEGER NOT NULL DEFAULT 0,
///     character_count INTEGER NOT NULL DEFAULT 0,
///     audio_duration_seconds REAL NOT NULL DEFAULT 0,
///     PRIMARY KEY (user_id, day)
/// )
pub fn create_user_daily_stats_table() -> String {
    Table::create()
        .table(UserDailyStats::Table)
        .if_not_exists()
        .col(ColumnDef::new(UserDailyStats::UserId).big_integer().not_null())
        .col(ColumnDef::new(UserDailyStats::Day).text().not_null())
        .col(
            ColumnDef::new(UserDailyStats::GenerationCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(UserDailyStats::CharacterCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .col(
            ColumnDef::new(UserDailyStats::AudioDurationSeconds)
                .double()
                .not_null()
                .default(0.0),
        )
        .primary_key(
            Index::create()
                .col(UserDailyStats::UserId)
                .col(UserDailyStats::Day),
        )
        .foreign_key(
            ForeignKey::create()
                .from(UserDailyStats::Table, UserDailyStats::UserId)
                .to(Users::Table, Users::Id)
                .on_delete(ForeignKeyAction::Cascade),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS voice_usage_stats (voice_id TEXT PRIMARY KEY, use_count INTEGER NOT NULL DEFAULT 0)
pub fn create_voice_usage_stats_table() -> String {
    Table::create()
        .table(VoiceUsageStats::Table)
        .if_not_exists()
        .col(ColumnDef::new(VoiceUsageStats::VoiceId).text().primary_key())
        .col(
            ColumnDef::new(VoiceUsageStats::UseCount)
                .big_integer()
                .not_null()
                .default(0),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_generations_created_at ON audio_generations(created_at_ms)
pub fn create_generations_created_at_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_generations_created_at")
        .table(AudioGenerations::Table)
        .col(AudioGenerations::CreatedAtMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_generations_owner ON audio_generations(owner_id, created_at_ms)
pub fn create_generations_owner_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_generations_owner")
        .table(AudioGenerations::Table)
        .col(AudioGenerations::OwnerId)
        .col(AudioGenerations::CreatedAtMs)
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)
pub fn create_sessions_user_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_sessions_user")
        .table(Sessions::Table)
        .col(Sessions::UserId)
        .to_string(SqliteQueryBuilder)
}

use sea_query::{Expr, Order, Query, SqliteQueryBuilder};

use crate::schema::AudioGenerations;

/// Columns read back into a `GenerationRecord`, in struct order
pub const RECORD_COLUMNS: [AudioGenerations; 12] = [
    AudioGenerations::Id,
    AudioGenerations::Text,
    AudioGenerations::VoiceId,
    AudioGenerations::VoiceName,
    AudioGenerations::Stability,
    AudioGenerations::Clarity,
    AudioGenerations::Format,
    AudioGenerations::AudioUrl,
    AudioGenerations::DurationSeconds,
    AudioGenerations::DownloadCount,
    AudioGenerations::OwnerId,
    AudioGenerations::CreatedAtMs,
];

/// INSERT INTO audio_generations (text, voice_id, voice_name, stability, clarity, format,
///     audio_url, duration_seconds, download_count, owner_id, created_at_ms)
/// VALUES (?, ?, ?, ?, ?, ?, '', ?, 0, ?, ?)
#[allow(clippy::too_many_arguments)]
pub fn insert(
    text: &str,
    voice_id: &str,
    voice_name: &str,
    stability: i64,
    clarity: i64,
    format: &str,
    duration_seconds: f64,
    owner_id: Option<i64>,
    created_at_ms: i64,
) -> String {
    Query::insert()
        .into_table(AudioGenerations::Table)
        .columns([
            AudioGenerations::Text,
            AudioGenerations::VoiceId,
            AudioGenerations::VoiceName,
            AudioGenerations::Stability,
            AudioGenerations::Clarity,
            AudioGenerations::Format,
            AudioGenerations::AudioUrl,
            AudioGenerations::DurationSeconds,
            AudioGenerations::DownloadCount,
            AudioGenerations::OwnerId,
            AudioGenerations::CreatedAtMs,
        ])
        .values_panic([
            text.into(),
            voice_id.into(),
            voice_name.into(),
            stability.into(),
            clarity.into(),
            format.into(),
            "".into(),
            duration_seconds.into(),
            0i64.into(),
            owner_id.into(),
            created_at_ms.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <record columns> FROM audio_generations WHERE id = ?
pub fn select_by_id(id: i64) -> String {
    Query::select()
        .columns(RECORD_COLUMNS)
        .from(AudioGenerations::Table)
        .and_where(Expr::col(AudioGenerations::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <record columns> FROM audio_generations
/// ORDER BY created_at_ms DESC, id DESC LIMIT ?
pub fn select_recent(limit: u64) -> String {
    Query::select()
        .columns(RECORD_COLUMNS)
        .from(AudioGenerations::Table)
        .order_by(AudioGenerations::CreatedAtMs, Order::Desc)
        .order_by(AudioGenerations::Id, Order::Desc)
        .limit(limit)
        .to_string(SqliteQueryBuilder)
}

/// SELECT <record columns> FROM audio_generations WHERE owner_id = ?
/// ORDER BY created_at_ms DESC, id DESC LIMIT ?
pub fn select_by_owner(owner_id: i64, limit: u64) -> String {
    Query::select()
        .columns(RECORD_COLUMNS)
        .from(AudioGenerations::Table)
        .and_where(Expr::col(AudioGenerations::OwnerId).eq(owner_id))
        .order_by(AudioGenerations::CreatedAtMs, Order::Desc)
        .order_by(AudioGenerations::Id, Order::Desc)
        .limit(limit)
        .to_string(SqliteQueryBuilder)
}

/// UPDATE audio_generations SET download_count = download_count + 1 WHERE id = ?
///
/// Single statement so concurrent downloads never lose an increment
pub fn increment_download_count(id: i64) -> String {
    Query::update()
        .table(AudioGenerations::Table)
        .value(
            AudioGenerations::DownloadCount,
            Expr::col(AudioGenerations::DownloadCount).add(1),
        )
        .and_where(Expr::col(AudioGenerations::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM audio_generations WHERE id = ?
pub fn delete_by_id(id: i64) -> String {
    Query::delete()
        .from_table(AudioGenerations::Table)
        .and_where(Expr::col(AudioGenerations::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

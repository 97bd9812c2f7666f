use sea_query::{Alias, Expr, Func, OnConflict, Order, Query, SqliteQueryBuilder};

use crate::schema::{AudioGenerations, UserDailyStats, VoiceUsageStats, Voices};

/// INSERT INTO user_daily_stats (user_id, day, generation_count, character_count, audio_duration_seconds)
/// VALUES (?, ?, 1, ?, ?)
/// ON CONFLICT (user_id, day) DO UPDATE SET
///     generation_count = user_daily_stats.generation_count + 1,
///     character_count = user_daily_stats.character_count + ?,
///     audio_duration_seconds = user_daily_stats.audio_duration_seconds + ?
pub fn upsert_daily(user_id: i64, day: &str, characters: i64, duration_seconds: f64) -> String {
    Query::insert()
        .into_table(UserDailyStats::Table)
        .columns([
            UserDailyStats::UserId,
            UserDailyStats::Day,
            UserDailyStats::GenerationCount,
            UserDailyStats::CharacterCount,
            UserDailyStats::AudioDurationSeconds,
        ])
        .values_panic([
            user_id.into(),
            day.into(),
            1i64.into(),
            characters.into(),
            duration_seconds.into(),
        ])
        .on_conflict(
            OnConflict::columns([UserDailyStats::UserId, UserDailyStats::Day])
                .value(
                    UserDailyStats::GenerationCount,
                    Expr::col((UserDailyStats::Table, UserDailyStats::GenerationCount)).add(1),
                )
                .value(
                    UserDailyStats::CharacterCount,
                    Expr::col((UserDailyStats::Table, UserDailyStats::CharacterCount))
                        .add(characters),
                )
                .value(
                    UserDailyStats::AudioDurationSeconds,
                    Expr::col((
                        UserDailyStats::Table,
                        UserDailyStats::AudioDurationSeconds,
                    ))
                    .add(duration_seconds),
                )
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT user_id, day, generation_count, character_count, audio_duration_seconds
/// FROM user_daily_stats WHERE user_id = ? AND day = ?
pub fn select_daily(user_id: i64, day: &str) -> String {
    Query::select()
        .columns([
            UserDailyStats::UserId,
            UserDailyStats::Day,
            UserDailyStats::GenerationCount,
            UserDailyStats::CharacterCount,
            UserDailyStats::AudioDurationSeconds,
        ])
        .from(UserDailyStats::Table)
        .and_where(Expr::col(UserDailyStats::UserId).eq(user_id))
        .and_where(Expr::col(UserDailyStats::Day).eq(day))
        .to_string(SqliteQueryBuilder)
}

/// SELECT user_id, day, generation_count, character_count, audio_duration_seconds
/// FROM user_daily_stats WHERE user_id = ? AND day >= ? ORDER BY day ASC
pub fn select_daily_since(user_id: i64, from_day: &str) -> String {
    Query::select()
        .columns([
            UserDailyStats::UserId,
            UserDailyStats::Day,
            UserDailyStats::GenerationCount,
            UserDailyStats::CharacterCount,
            UserDailyStats::AudioDurationSeconds,
        ])
        .from(UserDailyStats::Table)
        .and_where(Expr::col(UserDailyStats::UserId).eq(user_id))
        .and_where(Expr::col(UserDailyStats::Day).gte(from_day))
        .order_by(UserDailyStats::Day, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT COALESCE(SUM(character_count), 0), CAST(COALESCE(SUM(audio_duration_seconds), 0) AS REAL)
/// FROM user_daily_stats WHERE user_id = ?
pub fn select_lifetime_totals(user_id: i64) -> String {
    Query::select()
        .expr(Func::coalesce([
            Func::sum(Expr::col(UserDailyStats::CharacterCount)).into(),
            Expr::val(0i64).into(),
        ]))
        .expr(Func::cast_as(
            Func::coalesce([
                Func::sum(Expr::col(UserDailyStats::AudioDurationSeconds)).into(),
                Expr::val(0i64).into(),
            ]),
            Alias::new("REAL"),
        ))
        .from(UserDailyStats::Table)
        .and_where(Expr::col(UserDailyStats::UserId).eq(user_id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT COALESCE(SUM(generation_count), 0) FROM user_daily_stats WHERE user_id = ? AND day >= ?
pub fn select_generation_count_since(user_id: i64, from_day: &str) -> String {
    Query::select()
        .expr(Func::coalesce([
            Func::sum(Expr::col(UserDailyStats::GenerationCount)).into(),
            Expr::val(0i64).into(),
        ]))
        .from(UserDailyStats::Table)
        .and_where(Expr::col(UserDailyStats::UserId).eq(user_id))
        .and_where(Expr::col(UserDailyStats::Day).gte(from_day))
        .to_string(SqliteQueryBuilder)
}

/// SELECT COALESCE(SUM(download_count), 0) FROM audio_generations WHERE owner_id = ?
pub fn select_total_downloads(owner_id: i64) -> String {
    Query::select()
        .expr(Func::coalesce([
            Func::sum(Expr::col(AudioGenerations::DownloadCount)).into(),
            Expr::val(0i64).into(),
        ]))
        .from(AudioGenerations::Table)
        .and_where(Expr::col(AudioGenerations::OwnerId).eq(owner_id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT voice_id, MAX(voice_name) AS voice_name, COUNT(id) AS use_count
/// FROM audio_generations WHERE owner_id = ?
/// GROUP BY voice_id ORDER BY use_count DESC, voice_id ASC LIMIT ?
pub fn select_popular_voices(owner_id: i64, limit: u64) -> String {
    Query::select()
        .column(AudioGenerations::VoiceId)
        .expr_as(
            Func::max(Expr::col(AudioGenerations::VoiceName)),
            Alias::new("voice_name"),
        )
        .expr_as(
            Func::count(Expr::col(AudioGenerations::Id)),
            Alias::new("use_count"),
        )
        .from(AudioGenerations::Table)
        .and_where(Expr::col(AudioGenerations::OwnerId).eq(owner_id))
        .group_by_col(AudioGenerations::VoiceId)
        .order_by(Alias::new("use_count"), Order::Desc)
        .order_by(AudioGenerations::VoiceId, Order::Asc)
        .limit(limit)
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO voice_usage_stats (voice_id, use_count) VALUES (?, 1)
/// ON CONFLICT (voice_id) DO UPDATE SET use_count = voice_usage_stats.use_count + 1
pub fn increment_voice_usage(voice_id: &str) -> String {
    Query::insert()
        .into_table(VoiceUsageStats::Table)
        .columns([VoiceUsageStats::VoiceId, VoiceUsageStats::UseCount])
        .values_panic([voice_id.into(), 1i64.into()])
        .on_conflict(
            OnConflict::column(VoiceUsageStats::VoiceId)
                .value(
                    VoiceUsageStats::UseCount,
                    Expr::col((VoiceUsageStats::Table, VoiceUsageStats::UseCount)).add(1),
                )
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO voice_usage_stats (voice_id, use_count) VALUES (?, 0) ON CONFLICT (voice_id) DO NOTHING
pub fn seed_voice_usage(voice_id: &str) -> String {
    Query::insert()
        .into_table(VoiceUsageStats::Table)
        .columns([VoiceUsageStats::VoiceId, VoiceUsageStats::UseCount])
        .values_panic([voice_id.into(), 0i64.into()])
        .on_conflict(
            OnConflict::column(VoiceUsageStats::VoiceId)
                .do_nothing()
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT use_count FROM voice_usage_stats WHERE voice_id = ?
pub fn select_voice_usage(voice_id: &str) -> String {
    Query::select()
        .column(VoiceUsageStats::UseCount)
        .from(VoiceUsageStats::Table)
        .and_where(Expr::col(VoiceUsageStats::VoiceId).eq(voice_id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT u.voice_id, v.name, u.use_count
/// FROM voice_usage_stats u LEFT JOIN voices v ON v.id = u.voice_id
/// ORDER BY u.use_count DESC, u.voice_id ASC
pub fn select_all_voice_usage() -> String {
    Query::select()
        .column((VoiceUsageStats::Table, VoiceUsageStats::VoiceId))
        .column((Voices::Table, Voices::Name))
        .column((VoiceUsageStats::Table, VoiceUsageStats::UseCount))
        .from(VoiceUsageStats::Table)
        .left_join(
            Voices::Table,
            Expr::col((Voices::Table, Voices::Id))
                .equals((VoiceUsageStats::Table, VoiceUsageStats::VoiceId)),
        )
        .order_by(
            (VoiceUsageStats::Table, VoiceUsageStats::UseCount),
            Order::Desc,
        )
        .order_by(
            (VoiceUsageStats::Table, VoiceUsageStats::VoiceId),
            Order::Asc,
        )
        .to_string(SqliteQueryBuilder)
}

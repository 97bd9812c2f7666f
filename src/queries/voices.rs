use sea_query::{Expr, OnConflict, Order, Query, SqliteQueryBuilder};

use crate::models::Voice;
use crate::schema::Voices;

pub const VOICE_COLUMNS: [Voices; 10] = [
    Voices::Id,
    Voices::Name,
    Voices::Description,
    Voices::Language,
    Voices::Category,
    Voices::Premium,
    Voices::Gender,
    Voices::Accent,
    Voices::Age,
    Voices::UseCase,
];

/// INSERT INTO voices (...) VALUES (...)
/// ON CONFLICT (id) DO UPDATE SET name = excluded.name, ... (all display fields)
pub fn upsert(voice: &Voice, updated_at_ms: i64) -> String {
    Query::insert()
        .into_table(Voices::Table)
        .columns([
            Voices::Id,
            Voices::Name,
            Voices::Description,
            Voices::Language,
            Voices::Category,
            Voices::Premium,
            Voices::Gender,
            Voices::Accent,
            Voices::Age,
            Voices::UseCase,
            Voices::UpdatedAtMs,
        ])
        .values_panic([
            voice.id.as_str().into(),
            voice.name.as_str().into(),
            voice.description.clone().into(),
            voice.language.clone().into(),
            voice.category.clone().into(),
            voice.premium.into(),
            voice.gender.clone().into(),
            voice.accent.clone().into(),
            voice.age.clone().into(),
            voice.use_case.clone().into(),
            updated_at_ms.into(),
        ])
        .on_conflict(
            OnConflict::column(Voices::Id)
                .update_columns([
                    Voices::Name,
                    Voices::Description,
                    Voices::Language,
                    Voices::Category,
                    Voices::Premium,
                    Voices::Gender,
                    Voices::Accent,
                    Voices::Age,
                    Voices::UseCase,
                    Voices::UpdatedAtMs,
                ])
                .to_owned(),
        )
        .to_string(SqliteQueryBuilder)
}

/// SELECT <voice columns> FROM voices ORDER BY name
pub fn select_all() -> String {
    Query::select()
        .columns(VOICE_COLUMNS)
        .from(Voices::Table)
        .order_by(Voices::Name, Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT <voice columns> FROM voices WHERE id = ?
pub fn select_by_id(id: &str) -> String {
    Query::select()
        .columns(VOICE_COLUMNS)
        .from(Voices::Table)
        .and_where(Expr::col(Voices::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

use sea_query::{Expr, Query, SqliteQueryBuilder};

use crate::schema::Users;

/// Columns read back into a `User`, in struct order
pub const USER_COLUMNS: [Users; 10] = [
    Users::Id,
    Users::Username,
    Users::Email,
    Users::Password,
    Users::FullName,
    Users::AvatarUrl,
    Users::TotalGenerations,
    Users::MonthlyQuota,
    Users::CreatedAtMs,
    Users::LastLoginAtMs,
];

/// INSERT INTO users (username, email, password, full_name, total_generations, monthly_quota, created_at_ms)
/// VALUES (?, ?, ?, ?, 0, ?, ?)
pub fn insert(
    username: &str,
    email: &str,
    password_hash: &str,
    full_name: Option<&str>,
    monthly_quota: i64,
    created_at_ms: i64,
) -> String {
    Query::insert()
        .into_table(Users::Table)
        .columns([
            Users::Username,
            Users::Email,
            Users::Password,
            Users::FullName,
            Users::TotalGenerations,
            Users::MonthlyQuota,
            Users::CreatedAtMs,
        ])
        .values_panic([
            username.into(),
            email.into(),
            password_hash.into(),
            full_name.map(str::to_string).into(),
            0i64.into(),
            monthly_quota.into(),
            created_at_ms.into(),
        ])
        .to_string(SqliteQueryBuilder)
}

/// SELECT <user columns> FROM users WHERE id = ?
pub fn select_by_id(id: i64) -> String {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <user columns> FROM users WHERE username = ?
pub fn select_by_username(username: &str) -> String {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Username).eq(username))
        .to_string(SqliteQueryBuilder)
}

/// SELECT <user columns> FROM users WHERE email = ?
pub fn select_by_email(email: &str) -> String {
    Query::select()
        .columns(USER_COLUMNS)
        .from(Users::Table)
        .and_where(Expr::col(Users::Email).eq(email))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE users SET last_login_at_ms = ? WHERE id = ?
pub fn update_last_login(id: i64, at_ms: i64) -> String {
    Query::update()
        .table(Users::Table)
        .value(Users::LastLoginAtMs, at_ms)
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

/// UPDATE users SET total_generations = total_generations + 1 WHERE id = ?
pub fn increment_total_generations(id: i64) -> String {
    Query::update()
        .table(Users::Table)
        .value(
            Users::TotalGenerations,
            Expr::col(Users::TotalGenerations).add(1),
        )
        .and_where(Expr::col(Users::Id).eq(id))
        .to_string(SqliteQueryBuilder)
}

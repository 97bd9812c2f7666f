//! User accounts and password hashing

use chrono::Utc;
use log::{info, warn};
use serde::Deserialize;
use sqlx::sqlite::SqlitePool;

use crate::constants::generate_salt;
use crate::error::AppError;
use crate::models::User;
use crate::queries::users;

const SCRYPT_LOG_N: u8 = 14; // N = 16384
const SCRYPT_R: u32 = 8;
const SCRYPT_P: u32 = 1;
const HASH_LEN: usize = 64;

const MIN_USERNAME_CHARS: usize = 3;
const MAX_USERNAME_CHARS: usize = 30;
const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let name_len = self.username.chars().count();
        if !(MIN_USERNAME_CHARS..=MAX_USERNAME_CHARS).contains(&name_len) {
            return Err(AppError::Validation(format!(
                "Username must be between {} and {} characters",
                MIN_USERNAME_CHARS, MAX_USERNAME_CHARS
            )));
        }
        let email = self.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => return Err(AppError::Validation("Invalid email address".to_string())),
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

fn derive_key(password: &str, salt: &str) -> Result<[u8; HASH_LEN], AppError> {
    let params = scrypt::Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, HASH_LEN)
        .map_err(|e| AppError::Internal(format!("invalid scrypt parameters: {}", e)))?;
    let mut out = [0u8; HASH_LEN];
    scrypt::scrypt(password.as_bytes(), salt.as_bytes(), &params, &mut out)
        .map_err(|e| AppError::Internal(format!("scrypt failed: {}", e)))?;
    Ok(out)
}

/// Hash as `<hex key>.<salt>`
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = generate_salt();
    let key = derive_key(password, &salt)?;
    Ok(format!("{}.{}", hex::encode(key), salt))
}

/// Check `password` against a stored `<hex key>.<salt>` string in constant time
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((hashed, salt)) = stored.split_once('.') else {
        return false;
    };
    let Ok(expected) = hex::decode(hashed) else {
        return false;
    };
    match derive_key(password, salt) {
        Ok(supplied) => constant_time_eq(&expected, &supplied),
        Err(_) => false,
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&users::select_by_id(id))
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(User::from_row).transpose()
}

pub async fn find_by_username(pool: &SqlitePool, username: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&users::select_by_username(username))
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(User::from_row).transpose()
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let row = sqlx::query(&users::select_by_email(email))
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(User::from_row).transpose()
}

/// Create an account. Username and email must both be unused.
pub async fn register(
    pool: &SqlitePool,
    req: RegisterRequest,
    monthly_quota: i64,
) -> Result<User, AppError> {
    req.validate()?;
    let email = req.email.trim().to_string();

    if find_by_username(pool, &req.username).await?.is_some() {
        return Err(AppError::Validation("Username already exists".to_string()));
    }
    if find_by_email(pool, &email).await?.is_some() {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let password = req.password;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing aborted: {}", e)))??;

    let sql = users::insert(
        &req.username,
        &email,
        &hash,
        req.full_name.as_deref(),
        monthly_quota,
        Utc::now().timestamp_millis(),
    );
    let id = match sqlx::query(&sql).execute(pool).await {
        Ok(result) => result.last_insert_rowid(),
        // lost a race with a concurrent registration of the same name
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Validation(
                "Username or email already exists".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };

    info!("Registered user {} (id {})", req.username, id);
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", id)))
}

/// Verify credentials and stamp `last_login_at`. `username` may be an email.
pub async fn authenticate(pool: &SqlitePool, req: LoginRequest) -> Result<User, AppError> {
    let user = if req.username.contains('@') {
        find_by_email(pool, req.username.trim()).await?
    } else {
        find_by_username(pool, &req.username).await?
    };
    let Some(user) = user else {
        warn!("Login failed: unknown user {}", req.username);
        return Err(AppError::InvalidCredentials);
    };

    let stored = user.password_hash.clone();
    let password = req.password;
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
        .await
        .unwrap_or(false);
    if !ok {
        warn!("Login failed: bad password for {}", user.username);
        return Err(AppError::InvalidCredentials);
    }

    sqlx::query(&users::update_last_login(user.id, Utc::now().timestamp_millis()))
        .execute(pool)
        .await?;

    find_by_id(pool, user.id)
        .await?
        .ok_or(AppError::InvalidCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("correct horse").unwrap();
        let (hash, salt) = stored.split_once('.').unwrap();
        assert_eq!(hash.len(), HASH_LEN * 2);
        assert_eq!(salt.len(), 32);

        assert!(verify_password("correct horse", &stored));
        assert!(!verify_password("wrong horse", &stored));
    }

    #[test]
    fn test_verify_rejects_malformed() {
        assert!(!verify_password("x", "no-dot-here"));
        assert!(!verify_password("x", "zz.salt"));
        assert!(!verify_password("x", "abcd.salt"));
    }

    #[test]
    fn test_register_validation() {
        let ok = RegisterRequest {
            username: "alice".into(),
            email: "alice@example.com".into(),
            password: "password1".into(),
            full_name: None,
        };
        assert!(ok.validate().is_ok());

        let mut short = ok.clone();
        short.username = "al".into();
        assert!(short.validate().is_err());

        let mut bad_email = ok.clone();
        bad_email.email = "alice.example.com".into();
        assert!(bad_email.validate().is_err());

        let mut weak = ok;
        weak.password = "short".into();
        assert!(weak.validate().is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::constants::{
    DEFAULT_CLARITY, DEFAULT_STABILITY, MAX_TEXT_CHARS, MAX_TUNING_VALUE, MIN_TEXT_CHARS,
};
use crate::error::AppError;

/// Convert a stored millisecond timestamp into a UTC datetime
pub fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

/// Persisted metadata describing one text to speech request.
///
/// Audio bytes are never stored here; `audio_url` is an empty placeholder and
/// playback always re-synthesizes from (text, voice_id, stability, clarity).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRecord {
    pub id: i64,
    pub text: String,
    pub voice_id: String,
    /// Voice display name as it was when the record was created
    pub voice_name: String,
    pub stability: i64,
    pub clarity: i64,
    pub format: String,
    pub audio_url: String,
    /// Estimated from payload size, see `audio::estimate_duration_seconds`
    pub duration: f64,
    pub download_count: i64,
    pub owner_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            text: row.try_get("text")?,
            voice_id: row.try_get("voice_id")?,
            voice_name: row.try_get("voice_name")?,
            stability: row.try_get("stability")?,
            clarity: row.try_get("clarity")?,
            format: row.try_get("format")?,
            audio_url: row.try_get("audio_url")?,
            duration: row.try_get("duration_seconds")?,
            download_count: row.try_get("download_count")?,
            owner_id: row.try_get("owner_id")?,
            created_at: millis_to_datetime(row.try_get("created_at_ms")?),
        })
    }

    /// The parameter tuple that reproduces this record's audio
    pub fn synthesis_params(&self) -> SynthesisParams {
        SynthesisParams {
            text: self.text.clone(),
            voice_id: self.voice_id.clone(),
            stability: self.stability,
            clarity: self.clarity,
        }
    }

    pub fn character_count(&self) -> i64 {
        self.text.chars().count() as i64
    }
}

/// Fields supplied by the caller when persisting a new generation
#[derive(Debug, Clone)]
pub struct NewGeneration {
    pub params: SynthesisParams,
    pub voice_name: String,
    pub format: String,
    pub duration: f64,
    pub owner_id: Option<i64>,
}

/// Body of `POST /api/text-to-speech`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TtsRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub voice_id: String,
    pub stability: Option<i64>,
    pub clarity: Option<i64>,
}

impl TtsRequest {
    /// Apply defaults and range checks, producing parameters safe to synthesize
    pub fn validate(self) -> Result<SynthesisParams, AppError> {
        SynthesisParams::new(
            self.text,
            self.voice_id,
            self.stability.unwrap_or(DEFAULT_STABILITY),
            self.clarity.unwrap_or(DEFAULT_CLARITY),
        )
    }
}

/// A validated (text, voice, stability, clarity) tuple.
///
/// Only constructible through validation or from a stored record, so the
/// regeneration service never sees unchecked input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SynthesisParams {
    text: String,
    voice_id: String,
    stability: i64,
    clarity: i64,
}

impl SynthesisParams {
    pub fn new(
        text: String,
        voice_id: String,
        stability: i64,
        clarity: i64,
    ) -> Result<Self, AppError> {
        let chars = text.chars().count();
        if chars < MIN_TEXT_CHARS || text.trim().is_empty() {
            return Err(AppError::Validation("Text must not be empty".to_string()));
        }
        if chars > MAX_TEXT_CHARS {
            return Err(AppError::Validation(format!(
                "Text must be at most {} characters, got {}",
                MAX_TEXT_CHARS, chars
            )));
        }
        if voice_id.trim().is_empty() {
            return Err(AppError::Validation("voiceId is required".to_string()));
        }
        check_tuning("stability", stability)?;
        check_tuning("clarity", clarity)?;

        Ok(Self {
            text,
            voice_id,
            stability,
            clarity,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn stability(&self) -> i64 {
        self.stability
    }

    pub fn clarity(&self) -> i64 {
        self.clarity
    }

    pub fn character_count(&self) -> i64 {
        self.text.chars().count() as i64
    }
}

fn check_tuning(name: &str, value: i64) -> Result<(), AppError> {
    if !(0..=MAX_TUNING_VALUE).contains(&value) {
        return Err(AppError::Validation(format!(
            "{} must be between 0 and {}, got {}",
            name, MAX_TUNING_VALUE, value
        )));
    }
    Ok(())
}

/// Cached entry of the provider's voice catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub premium: bool,
    pub gender: Option<String>,
    pub accent: Option<String>,
    pub age: Option<String>,
    pub use_case: Option<String>,
}

impl Voice {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            language: row.try_get("language")?,
            category: row.try_get("category")?,
            premium: row.try_get("premium")?,
            gender: row.try_get("gender")?,
            accent: row.try_get("accent")?,
            age: row.try_get("age")?,
            use_case: row.try_get("use_case")?,
        })
    }
}

/// Registered account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub total_generations: i64,
    pub monthly_quota: i64,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        let last_login: Option<i64> = row.try_get("last_login_at_ms")?;
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password")?,
            full_name: row.try_get("full_name")?,
            avatar_url: row.try_get("avatar_url")?,
            total_generations: row.try_get("total_generations")?,
            monthly_quota: row.try_get("monthly_quota")?,
            created_at: millis_to_datetime(row.try_get("created_at_ms")?),
            last_login_at: last_login.map(millis_to_datetime),
        })
    }
}

/// One (user, day) usage rollup row
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDailyStats {
    #[serde(skip_serializing)]
    pub user_id: i64,
    #[serde(rename = "date")]
    pub day: String,
    pub generation_count: i64,
    pub character_count: i64,
    pub audio_duration_seconds: f64,
}

impl UserDailyStats {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            user_id: row.try_get("user_id")?,
            day: row.try_get("day")?,
            generation_count: row.try_get("generation_count")?,
            character_count: row.try_get("character_count")?,
            audio_duration_seconds: row.try_get("audio_duration_seconds")?,
        })
    }
}

/// Usage counter for one voice across all users
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceUsageStats {
    pub voice_id: String,
    pub voice_name: Option<String>,
    pub use_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularVoice {
    pub voice_id: String,
    pub name: String,
    pub count: i64,
}

/// Response body of `GET /api/user/stats`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatsSummary {
    pub total_generations: i64,
    pub total_characters: i64,
    pub total_duration: f64,
    pub total_downloads: i64,
    pub recent_activity: Vec<UserDailyStats>,
    pub popular_voices: Vec<PopularVoice>,
    pub monthly_quota: i64,
    pub used_quota: i64,
}

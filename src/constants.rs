use rand::Rng;

/// Expected database schema version
/// Databases created with another version are refused at startup
pub const EXPECTED_DB_VERSION: &str = "1";

/// Input text limits (characters, not bytes)
pub const MIN_TEXT_CHARS: usize = 1;
pub const MAX_TEXT_CHARS: usize = 5000;

/// Tuning parameters are percentages on the wire and in storage
pub const DEFAULT_STABILITY: i64 = 50;
pub const DEFAULT_CLARITY: i64 = 70;
pub const MAX_TUNING_VALUE: i64 = 100;

/// Container format of every generation (the provider is always asked for mp3)
pub const DEFAULT_FORMAT: &str = "mp3";
pub const DEFAULT_CONTENT_TYPE: &str = "audio/mpeg";

/// Snapshot name used when the voice is missing from the local catalog cache
pub const UNKNOWN_VOICE_NAME: &str = "Unknown";

/// Listing limits
pub const DEFAULT_RECENT_LIMIT: u64 = 10;
pub const DEFAULT_OWNER_LIMIT: u64 = 50;
pub const MAX_LIST_LIMIT: u64 = 100;

/// Number of days (including today) returned as recent activity
pub const RECENT_ACTIVITY_DAYS: i64 = 7;
/// Number of voices returned in a user's popular voices list
pub const POPULAR_VOICES_LIMIT: u64 = 5;

/// Generate a random 16-byte salt, hex encoded
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Generate an opaque session token
pub fn generate_session_token() -> String {
    format!("sess_{}", uuid::Uuid::new_v4().simple())
}

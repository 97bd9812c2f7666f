use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials;

/// Environment variable consulted when no key is configured
pub const API_KEY_ENV: &str = "ELEVEN_LABS_API_KEY";

fn default_port() -> u16 {
    5000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

/// Server configuration file structure
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port (default: 5000)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address (default: 0.0.0.0)
    #[serde(default = "default_bind")]
    pub bind: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub users: UsersConfig,
}

/// Datastore settings (maps to [database])
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, created if missing
    pub path: PathBuf,
    /// Upper bound on pooled connections (default: 10)
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
    /// How long a request may wait for a connection before failing (default: 5)
    #[serde(default = "DatabaseConfig::default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    fn default_max_connections() -> u32 {
        10
    }

    fn default_acquire_timeout_secs() -> u64 {
        5
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Text to speech provider settings (maps to [provider])
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Inline key; prefer `credential_profile`
    pub api_key: Option<String>,
    /// Profile name under [elevenlabs.<profile>] in ~/.config/tts_studio/credentials.toml
    pub credential_profile: Option<String>,
    pub model_id: String,
    pub output_format: String,
    /// Per call timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            api_key: None,
            credential_profile: None,
            model_id: "eleven_monolingual_v1".to_string(),
            output_format: "mp3_44100_128".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve the API key: inline value, then credential profile, then environment
    pub fn resolve_api_key(&self) -> Result<String, String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone());
        }
        if let Some(profile) = &self.credential_profile {
            let creds = credentials::load_credentials()
                .map_err(|e| format!("Failed to load credentials file: {}", e))?;
            return credentials::get_api_key(&creds, profile);
        }
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                format!(
                    "No provider API key: set [provider].api_key, [provider].credential_profile or {}",
                    API_KEY_ENV
                )
            })
    }
}

/// Login session settings (maps to [session])
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_days: i64,
    /// Adds `Secure` to the session cookie; enable behind HTTPS
    pub secure_cookie: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sid".to_string(),
            ttl_days: 30,
            secure_cookie: false,
        }
    }
}

/// Account defaults (maps to [users])
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersConfig {
    pub default_monthly_quota: i64,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            default_monthly_quota: 100,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path.display(), e))?;
        let config = Self::parse(&content)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.max_connections == 0 {
            return Err("[database].max_connections must be at least 1".to_string());
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err("[database].acquire_timeout_secs must be at least 1".to_string());
        }
        if self.provider.timeout_secs == 0 {
            return Err("[provider].timeout_secs must be at least 1".to_string());
        }
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(format!(
                "[provider].base_url must be an http(s) URL, got '{}'",
                self.provider.base_url
            ));
        }
        if self.session.cookie_name.is_empty() {
            return Err("[session].cookie_name must not be empty".to_string());
        }
        if self.session.ttl_days <= 0 {
            return Err("[session].ttl_days must be positive".to_string());
        }
        Ok(())
    }
}

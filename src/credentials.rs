use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Credentials file structure
///
/// Format:
/// ```toml
/// [elevenlabs.profile_name]
/// api_key = "your_provider_api_key_here"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub elevenlabs: HashMap<String, CredentialProfile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialProfile {
    pub api_key: String,
}

/// Get the default credentials file path: ~/.config/tts_studio/credentials.toml
pub fn get_credentials_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("tts_studio")
            .join("credentials.toml"),
    )
}

/// Load credentials from the default location
/// Returns None if the file doesn't exist
pub fn load_credentials() -> Result<Option<Credentials>, Box<dyn std::error::Error + Send + Sync>> {
    let Some(creds_path) = get_credentials_path() else {
        return Ok(None);
    };
    if !creds_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&creds_path)?;
    parse_credentials(&content).map(Some)
}

pub fn parse_credentials(content: &str) -> Result<Credentials, Box<dyn std::error::Error + Send + Sync>> {
    Ok(toml::from_str(content)?)
}

/// Get the provider API key for a profile
pub fn get_api_key(credentials: &Option<Credentials>, profile: &str) -> Result<String, String> {
    match credentials {
        Some(creds) => creds
            .elevenlabs
            .get(profile)
            .map(|p| p.api_key.clone())
            .ok_or_else(|| {
                format!(
                    "Credential profile '[elevenlabs.{}]' not found in credentials file",
                    profile
                )
            }),
        None => Err(format!(
            "Credentials file not found. Expected at: {}",
            get_credentials_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "~/.config/tts_studio/credentials.toml".to_string())
        )),
    }
}

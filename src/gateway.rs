//! Synthesis gateway: the only component that talks to the text to speech provider
//!
//! Two operations, `synthesize` and `list_voices`, each one outbound HTTPS call
//! with a bounded timeout. No retries; callers decide.

use log::{debug, info, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

use crate::audio;
use crate::models::{SynthesisParams, Voice};

const XI_API_KEY_HEADER: &str = "xi-api-key";

/// Every way a provider call can fail. All of them surface as one
/// synthesis failure to clients; the kind is kept for logs and tests.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("provider unreachable")]
    Unreachable(#[source] reqwest::Error),

    #[error("provider timed out")]
    Timeout,

    #[error("provider rejected the API key")]
    Unauthorized,

    #[error("provider rate limit reached")]
    RateLimited,

    #[error("provider returned status {0}")]
    Upstream(u16),

    /// Detail is kept for logs only
    #[error("malformed provider response")]
    Malformed(String),
}

impl SynthesisError {
    fn from_send(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SynthesisError::Timeout
        } else {
            SynthesisError::Unreachable(e)
        }
    }

    fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SynthesisError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => SynthesisError::RateLimited,
            other => SynthesisError::Upstream(other.as_u16()),
        }
    }
}

/// Freshly synthesized audio. Never persisted.
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Provider connection settings
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub api_key: String,
    pub model_id: String,
    pub output_format: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct VoiceSettings {
    stability: f64,
    similarity_boost: f64,
}

#[derive(Serialize)]
struct SynthesisBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<ProviderVoice>,
}

#[derive(Debug, Deserialize)]
struct ProviderVoice {
    voice_id: String,
    name: String,
    description: Option<String>,
    category: Option<String>,
    #[serde(default)]
    labels: HashMap<String, String>,
}

impl From<ProviderVoice> for Voice {
    fn from(v: ProviderVoice) -> Self {
        let category = v.category.unwrap_or_else(|| "standard".to_string());
        let mut labels = v.labels;
        Voice {
            id: v.voice_id,
            name: v.name,
            description: v.description,
            language: Some(
                labels
                    .remove("language")
                    .unwrap_or_else(|| "English".to_string()),
            ),
            premium: category == "premium",
            category: Some(category),
            gender: labels.remove("gender"),
            accent: labels.remove("accent"),
            age: labels.remove("age"),
            use_case: labels.remove("use_case"),
        }
    }
}

/// Percent (0-100) to the provider's 0.0-1.0 scale
fn to_unit_scale(value: i64) -> f64 {
    value as f64 / 100.0
}

#[derive(Clone)]
pub struct SynthesisGateway {
    client: Client,
    base_url: Url,
    settings: GatewaySettings,
}

impl SynthesisGateway {
    pub fn new(
        settings: GatewaySettings,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|e| format!("Invalid provider base_url '{}': {}", settings.base_url, e))?;
        if base_url.cannot_be_a_base() {
            return Err(format!("Provider base_url '{}' cannot carry a path", settings.base_url).into());
        }
        let client = Client::builder().timeout(settings.timeout).build()?;
        info!(
            "Synthesis provider: {} (model {}, format {}, timeout {:?})",
            settings.base_url, settings.model_id, settings.output_format, settings.timeout
        );
        Ok(Self {
            client,
            base_url,
            settings,
        })
    }

    /// Container format of every payload this gateway returns (e.g. `mp3`)
    pub fn format(&self) -> &str {
        audio::container_format(&self.settings.output_format)
    }

    pub fn output_format(&self) -> &str {
        &self.settings.output_format
    }

    /// Base URL with `segments` appended, each one percent-encoded as a single path segment
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Render (text, voice, stability, clarity) into audio bytes
    pub async fn synthesize(
        &self,
        params: &SynthesisParams,
    ) -> Result<SynthesizedAudio, SynthesisError> {
        let url = self.endpoint(&["text-to-speech", params.voice_id()]);
        let body = SynthesisBody {
            text: params.text(),
            model_id: &self.settings.model_id,
            voice_settings: VoiceSettings {
                stability: to_unit_scale(params.stability()),
                similarity_boost: to_unit_scale(params.clarity()),
            },
        };

        debug!(
            "Synthesizing {} chars with voice {}",
            params.character_count(),
            params.voice_id()
        );

        let response = self
            .client
            .post(url)
            .query(&[("output_format", self.settings.output_format.as_str())])
            .header(XI_API_KEY_HEADER, &self.settings.api_key)
            .header(ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(SynthesisError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Provider synthesis returned {}", status);
            return Err(SynthesisError::from_status(status));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| audio::content_type_for_format(self.format()).to_string());

        let bytes = response.bytes().await.map_err(SynthesisError::from_send)?;
        if bytes.is_empty() {
            return Err(SynthesisError::Malformed("empty audio payload".to_string()));
        }

        Ok(SynthesizedAudio {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    /// Fetch the provider's voice catalog
    pub async fn list_voices(&self) -> Result<Vec<Voice>, SynthesisError> {
        let response = self
            .client
            .get(self.endpoint(&["voices"]))
            .header(XI_API_KEY_HEADER, &self.settings.api_key)
            .send()
            .await
            .map_err(SynthesisError::from_send)?;

        let status = response.status();
        if !status.is_success() {
            warn!("Provider voice listing returned {}", status);
            return Err(SynthesisError::from_status(status));
        }

        let text = response.text().await.map_err(SynthesisError::from_send)?;
        let parsed: VoicesResponse = serde_json::from_str(&text).map_err(|e| {
            warn!("Provider voice listing could not be parsed: {}", e);
            SynthesisError::Malformed(e.to_string())
        })?;

        Ok(parsed.voices.into_iter().map(Voice::from).collect())
    }

    /// Reachability check: one authenticated catalog request, result discarded
    pub async fn check_connection(&self) -> Result<(), SynthesisError> {
        self.list_voices().await.map(|_| ())
    }
}

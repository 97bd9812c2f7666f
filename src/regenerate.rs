//! Regeneration service
//!
//! Audio bytes are never cached. A new generation synthesizes then persists the
//! parameter tuple; every replay looks the tuple up and synthesizes again.
//!
//! Per request lifecycle:
//! `Received -> Validating -> Synthesizing -> Persisting | Fetched -> StatsUpdating -> Responding`

use log::{debug, warn};
use sqlx::sqlite::SqlitePool;
use std::fmt;

use crate::audio;
use crate::error::AppError;
use crate::gateway::{SynthesisGateway, SynthesizedAudio};
use crate::generations;
use crate::models::{GenerationRecord, NewGeneration, SynthesisParams};
use crate::stats;
use crate::voices;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Received,
    Validating,
    Synthesizing,
    Persisting,
    Fetched,
    StatsUpdating,
    Responding,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Received => "received",
            Phase::Validating => "validating",
            Phase::Synthesizing => "synthesizing",
            Phase::Persisting => "persisting",
            Phase::Fetched => "fetched",
            Phase::StatsUpdating => "stats-updating",
            Phase::Responding => "responding",
        };
        f.write_str(name)
    }
}

/// Log a lifecycle transition for request `label`
pub fn enter(label: &str, phase: Phase) {
    debug!("[{}] {}", label, phase);
}

/// Whether a replay is a plain playback or the explicit download action.
/// Only downloads count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayMode {
    Playback,
    Download,
}

/// A persisted record together with the audio just synthesized for it
#[derive(Debug, Clone)]
pub struct Rendered {
    pub record: GenerationRecord,
    pub audio: SynthesizedAudio,
}

#[derive(Clone)]
pub struct Regenerator {
    pool: SqlitePool,
    gateway: SynthesisGateway,
}

impl Regenerator {
    pub fn new(pool: SqlitePool, gateway: SynthesisGateway) -> Self {
        Self { pool, gateway }
    }

    pub fn gateway(&self) -> &SynthesisGateway {
        &self.gateway
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// New generation path. Nothing is written unless synthesis succeeds.
    pub async fn generate(
        &self,
        owner_id: Option<i64>,
        params: SynthesisParams,
    ) -> Result<Rendered, AppError> {
        let label = format!("new:{}", params.voice_id());

        enter(&label, Phase::Synthesizing);
        let audio = self.gateway.synthesize(&params).await?;

        enter(&label, Phase::Persisting);
        let voice_name = voices::snapshot_name(&self.pool, params.voice_id()).await?;
        let new = NewGeneration {
            duration: audio::estimate_duration_seconds(
                audio.bytes.len(),
                self.gateway.output_format(),
            ),
            format: self.gateway.format().to_string(),
            voice_name,
            owner_id,
            params,
        };
        let record = generations::create(&self.pool, &new).await?;

        enter(&format!("generation:{}", record.id), Phase::StatsUpdating);
        self.update_stats(&record).await;

        enter(&format!("generation:{}", record.id), Phase::Responding);
        Ok(Rendered { record, audio })
    }

    /// Best effort. Failures are logged, never returned.
    async fn update_stats(&self, record: &GenerationRecord) {
        if let Some(owner_id) = record.owner_id {
            if let Err(e) = stats::record_generation(
                &self.pool,
                owner_id,
                record.character_count(),
                record.duration,
            )
            .await
            {
                warn!(
                    "Failed to update daily stats for user {} (generation {}): {}",
                    owner_id, record.id, e
                );
            }
        }
        if let Err(e) = stats::record_voice_usage(&self.pool, &record.voice_id).await {
            warn!(
                "Failed to update usage for voice {} (generation {}): {}",
                record.voice_id, record.id, e
            );
        }
    }

    /// Replay path: re-synthesize a stored record.
    ///
    /// A download increments the counter only after synthesis succeeded.
    pub async fn replay(&self, id: i64, mode: ReplayMode) -> Result<Rendered, AppError> {
        let label = format!("generation:{}", id);

        let mut record = generations::get(&self.pool, id).await?;
        enter(&label, Phase::Fetched);

        enter(&label, Phase::Synthesizing);
        let audio = self.gateway.synthesize(&record.synthesis_params()).await?;

        if mode == ReplayMode::Download {
            generations::increment_download_count(&self.pool, id).await?;
            record.download_count += 1;
        }

        enter(&label, Phase::Responding);
        Ok(Rendered { record, audio })
    }
}

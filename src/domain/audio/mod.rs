pub mod cache_key;
pub mod clock;
pub mod error;
pub mod eviction;
pub mod language;
pub mod service;
pub mod voice;

pub use cache_key::CacheKey;
pub use clock::{Clock, SystemClock};
pub use error::AudioServiceError;
pub use eviction::{CacheEvictor, SweepReport};
pub use language::{normalize_language, settings_for, DefaultVoiceTable, ResolvedSettings};
pub use service::{AudioService, AudioServiceApi};
pub use voice::{VoiceCatalogCache, VoiceResolver};

use serde::{Deserialize, Serialize};

/// Request for POST /api/audio/generate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

/// Where a stored audio entry can be fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioReference {
    pub key: CacheKey,
    pub url: String,
}

/// Outcome of a generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedAudio {
    pub reference: AudioReference,
    pub voice_id: String,
    pub language: String,
    /// `true` when served from the store without calling the provider
    pub cached: bool,
}

/// Response for POST /api/audio/generate
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAudioResponse {
    pub audio_url: String,
    pub key: String,
    pub voice_id: String,
    pub language: String,
    pub cached: bool,
}

impl From<GeneratedAudio> for GenerateAudioResponse {
    fn from(audio: GeneratedAudio) -> Self {
        Self {
            audio_url: audio.reference.url,
            key: audio.reference.key.to_string(),
            voice_id: audio.voice_id,
            language: audio.language,
            cached: audio.cached,
        }
    }
}

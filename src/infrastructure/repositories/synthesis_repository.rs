use crate::domain::audio::ResolvedSettings;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Failure reported by a speech provider
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("voice {voice_id} unavailable: {message}")]
    VoiceUnavailable { voice_id: String, message: String },
    #[error("synthesis timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("provider error: {0}")]
    Provider(String),
}

/// Audio chunks in playback order
pub type SynthesisStream = BoxStream<'static, Result<Bytes, SynthesisError>>;

/// One voice of a provider catalog, tagged with a language label as the
/// provider spells it ("ja", "ja-JP", "japanese", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogVoice {
    pub voice_id: String,
    pub language_label: String,
}

/// Speech provider performing the actual text to speech call.
///
/// Implementations own provider specifics: endpoints, authentication,
/// request shape and the mapping of provider errors onto
/// [`SynthesisError`] kinds. Callers buffer the whole stream before
/// persisting anything.
#[async_trait]
pub trait AudioSynthesisClient: Send + Sync {
    /// Start synthesis of `text` with `voice_id`
    ///
    /// # Errors
    /// Quota and voice errors must be reported with their dedicated kinds;
    /// everything else is [`SynthesisError::Provider`]
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        settings: ResolvedSettings,
    ) -> Result<SynthesisStream, SynthesisError>;
}

/// Lists the voices a provider can synthesize, best first
#[async_trait]
pub trait VoiceCatalogProvider: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<CatalogVoice>, SynthesisError>;
}

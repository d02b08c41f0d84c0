use super::error::AudioServiceError;
use super::language::{normalize_language, settings_for, ResolvedSettings, DEFAULT_LANGUAGE};
use super::voice::VoiceResolver;
use super::{AudioReference, AudioRequest, CacheKey, GeneratedAudio};
use crate::infrastructure::repositories::{
    AudioSynthesisClient, ContentStore, SynthesisError, UserLanguagePreferenceLookup,
};
use async_trait::async_trait;
use futures::StreamExt;
use moka::future::Cache;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Longest text accepted, in characters
pub const MAX_TEXT_CHARS: usize = 2500;
pub const MIN_SPEED: f32 = 0.5;
pub const MAX_SPEED: f32 = 2.0;

/// Upper bound on concurrently de-duplicated syntheses
const IN_FLIGHT_CAPACITY: u64 = 1024;

pub struct AudioService {
    store: Arc<dyn ContentStore>,
    synthesizer: Arc<dyn AudioSynthesisClient>,
    voice_resolver: VoiceResolver,
    user_languages: Arc<dyn UserLanguagePreferenceLookup>,
    synthesis_timeout: Duration,
    in_flight: Cache<CacheKey, AudioReference>,
}

impl AudioService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        synthesizer: Arc<dyn AudioSynthesisClient>,
        voice_resolver: VoiceResolver,
        user_languages: Arc<dyn UserLanguagePreferenceLookup>,
        synthesis_timeout: Duration,
    ) -> Self {
        Self {
            store,
            synthesizer,
            voice_resolver,
            user_languages,
            synthesis_timeout,
            in_flight: Cache::builder().max_capacity(IN_FLIGHT_CAPACITY).build(),
        }
    }
}

#[async_trait]
pub trait AudioServiceApi: Send + Sync {
    /// Produce pronunciation audio for learner text
    ///
    /// This operation:
    /// - Validates text length and speed
    /// - Resolves language, speech settings and voice (never fails)
    /// - Serves the stored entry when the fingerprint is already known
    /// - Otherwise synthesizes once, stores the complete audio, and returns it
    async fn generate_audio(&self, request: AudioRequest) -> Result<GeneratedAudio, AudioServiceError>;

    /// Stored audio bytes for a fingerprint
    async fn get_cached_audio(&self, key: &CacheKey) -> Result<Vec<u8>, AudioServiceError>;
}

#[async_trait]
impl AudioServiceApi for AudioService {
    async fn generate_audio(&self, request: AudioRequest) -> Result<GeneratedAudio, AudioServiceError> {
        tracing::info!(
            text_length = request.text.chars().count(),
            language = ?request.language,
            voice = ?request.voice,
            speed = ?request.speed,
            user_id = ?request.user_id,
            "Audio generation request"
        );

        // 1. Validate
        Self::validate(&request)?;

        // 2-4. Resolve language, settings and voice
        let language = self.resolve_language(&request).await;
        let settings = settings_for(&language, request.speed);
        let voice_id = self
            .voice_resolver
            .resolve(&language, request.voice.as_deref())
            .await;

        // 5. Fingerprint
        let key = CacheKey::derive(&request.text, &voice_id, settings.speed);

        tracing::debug!(
            key = %key,
            language = %language,
            voice_id = %voice_id,
            speed = settings.speed,
            style = settings.style,
            "Audio request resolved"
        );

        // 6. Serve from the store when possible
        if self.store.exists(&key).await? {
            tracing::info!(key = %key, voice_id = %voice_id, "Audio cache hit");
            return Ok(GeneratedAudio {
                reference: self.store.reference(&key),
                voice_id,
                language,
                cached: true,
            });
        }

        // 7-8. Synthesize and persist, shared by concurrent identical requests
        let result = self
            .in_flight
            .try_get_with(
                key.clone(),
                self.synthesize_and_store(&key, &request.text, &voice_id, settings),
            )
            .await;
        self.in_flight.invalidate(&key).await;
        let reference = result.map_err(|e| AudioServiceError::clone(&e))?;

        // 9. Return
        Ok(GeneratedAudio {
            reference,
            voice_id,
            language,
            cached: false,
        })
    }

    async fn get_cached_audio(&self, key: &CacheKey) -> Result<Vec<u8>, AudioServiceError> {
        match self.store.get(key).await? {
            Some(bytes) => {
                tracing::debug!(key = %key, size_bytes = bytes.len(), "Serving cached audio");
                Ok(bytes)
            }
            None => Err(AudioServiceError::NotFound),
        }
    }
}

impl AudioService {
    fn validate(request: &AudioRequest) -> Result<(), AudioServiceError> {
        if request.text.trim().is_empty() {
            return Err(AudioServiceError::Validation(
                "Text cannot be empty".to_string(),
            ));
        }

        let length = request.text.chars().count();
        if length > MAX_TEXT_CHARS {
            return Err(AudioServiceError::Validation(format!(
                "Text must be {} characters or less, got {}",
                MAX_TEXT_CHARS, length
            )));
        }

        if let Some(speed) = request.speed {
            // NaN fails the range check too
            if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
                return Err(AudioServiceError::Validation(format!(
                    "Speed must be between {} and {}",
                    MIN_SPEED, MAX_SPEED
                )));
            }
        }

        Ok(())
    }

    /// Request language, then the user's target language, then English
    async fn resolve_language(&self, request: &AudioRequest) -> String {
        if let Some(language) = request.language.as_deref().and_then(normalize_language) {
            return language;
        }

        if let Some(user_id) = request.user_id.as_deref().filter(|id| !id.trim().is_empty()) {
            match self.user_languages.target_language(user_id).await {
                Ok(Some(preference)) => {
                    if let Some(language) = normalize_language(&preference) {
                        return language;
                    }
                    tracing::warn!(
                        user_id = user_id,
                        preference = %preference,
                        "Ignoring malformed user language preference"
                    );
                }
                Ok(None) => {
                    tracing::debug!(user_id = user_id, "User has no target language");
                }
                Err(e) => {
                    tracing::warn!(
                        user_id = user_id,
                        error = %e,
                        "User language lookup failed, falling back to default"
                    );
                }
            }
        }

        DEFAULT_LANGUAGE.to_string()
    }

    async fn synthesize_and_store(
        &self,
        key: &CacheKey,
        text: &str,
        voice_id: &str,
        settings: ResolvedSettings,
    ) -> Result<AudioReference, AudioServiceError> {
        // A flight that finished between the caller's check and this one
        if self.store.exists(key).await? {
            tracing::debug!(key = %key, "Audio stored by an earlier flight");
            return Ok(self.store.reference(key));
        }

        let start_time = Instant::now();

        let audio = match tokio::time::timeout(
            self.synthesis_timeout,
            self.collect_audio(text, voice_id, settings),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::error!(
                    key = %key,
                    voice_id = voice_id,
                    timeout_secs = self.synthesis_timeout.as_secs_f64(),
                    "Speech synthesis timed out"
                );
                return Err(SynthesisError::Timeout(self.synthesis_timeout).into());
            }
        };

        let reference = self.store.put(key, &audio).await?;

        tracing::info!(
            key = %key,
            voice_id = voice_id,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.chars().count(),
            audio_size_bytes = audio.len(),
            "Audio synthesized and stored"
        );

        Ok(reference)
    }

    /// Concatenate provider chunks in order. Any chunk error drops the buffer.
    async fn collect_audio(
        &self,
        text: &str,
        voice_id: &str,
        settings: ResolvedSettings,
    ) -> Result<Vec<u8>, SynthesisError> {
        let mut stream = self.synthesizer.synthesize(voice_id, text, settings).await?;

        let mut buffer = Vec::new();
        while let Some(chunk) = stream.next().await {
            buffer.extend_from_slice(&chunk?);
        }

        if buffer.is_empty() {
            return Err(SynthesisError::Provider(
                "provider returned no audio".to_string(),
            ));
        }

        Ok(buffer)
    }
}

use super::synthesis_repository::{
    AudioSynthesisClient, CatalogVoice, SynthesisError, SynthesisStream, VoiceCatalogProvider,
};
use crate::domain::audio::ResolvedSettings;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const OUTPUT_FORMAT: &str = "mp3_44100_128";
const STABILITY: f32 = 0.5;
const SIMILARITY_BOOST: f32 = 0.75;

/// Range ElevenLabs accepts for `voice_settings.speed`
const MIN_PROVIDER_SPEED: f32 = 0.7;
const MAX_PROVIDER_SPEED: f32 = 1.2;

/// ElevenLabs implementation of the synthesis client and voice catalog
pub struct ElevenLabsTtsRepository {
    http: reqwest::Client,
    api_key: String,
    model_id: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    speed: f32,
    use_speaker_boost: bool,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceRecord>,
}

#[derive(Debug, Deserialize)]
struct VoiceRecord {
    voice_id: String,
    #[serde(default)]
    labels: Option<VoiceLabels>,
    #[serde(default)]
    verified_languages: Vec<VerifiedLanguage>,
}

#[derive(Debug, Deserialize)]
struct VoiceLabels {
    language: Option<String>,
    accent: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifiedLanguage {
    language: String,
}

impl ElevenLabsTtsRepository {
    pub fn new(api_key: String, model_id: String, base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Streaming endpoint for a voice. The voice id becomes a single path
    /// segment and must be a plain provider id.
    fn speech_url(&self, voice_id: &str) -> Result<Url, SynthesisError> {
        if !is_plain_voice_id(voice_id) {
            return Err(SynthesisError::VoiceUnavailable {
                voice_id: voice_id.to_string(),
                message: "not a valid ElevenLabs voice id".to_string(),
            });
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| SynthesisError::Provider(format!("Invalid ElevenLabs base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SynthesisError::Provider("ElevenLabs base URL cannot have a path".to_string()))?
            .pop_if_empty()
            .extend(["v1", "text-to-speech", voice_id, "stream"]);
        url.query_pairs_mut().append_pair("output_format", OUTPUT_FORMAT);

        Ok(url)
    }

    /// Fit a learner speed into the range the provider accepts
    fn provider_speed(speed: f32) -> f32 {
        speed.clamp(MIN_PROVIDER_SPEED, MAX_PROVIDER_SPEED)
    }

    /// Map a non-success response onto a synthesis error kind
    fn map_error(status: StatusCode, body: &str, voice_id: &str) -> SynthesisError {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let detail = parsed.as_ref().and_then(|v| v.get("detail"));
        let code = detail
            .and_then(|d| d.get("status"))
            .and_then(Value::as_str);
        let message = detail
            .and_then(|d| d.get("message").and_then(Value::as_str).or_else(|| d.as_str()))
            .unwrap_or(body)
            .to_string();

        match (status, code) {
            (_, Some("quota_exceeded")) | (StatusCode::TOO_MANY_REQUESTS, _) => {
                SynthesisError::QuotaExceeded(message)
            }
            (_, Some("voice_not_found")) | (StatusCode::NOT_FOUND, _) => {
                SynthesisError::VoiceUnavailable {
                    voice_id: voice_id.to_string(),
                    message,
                }
            }
            _ => SynthesisError::Provider(format!("ElevenLabs returned {}: {}", status, message)),
        }
    }

    /// Flatten the catalog into one entry per (voice, language label)
    fn catalog_from_response(response: VoicesResponse) -> Vec<CatalogVoice> {
        let mut catalog = Vec::new();

        for voice in response.voices {
            let mut labels: Vec<String> = voice
                .verified_languages
                .into_iter()
                .map(|v| v.language)
                .collect();
            if let Some(voice_labels) = voice.labels {
                labels.extend(voice_labels.language);
                labels.extend(voice_labels.accent);
            }

            for language_label in labels {
                catalog.push(CatalogVoice {
                    voice_id: voice.voice_id.clone(),
                    language_label,
                });
            }
        }

        catalog
    }
}

#[async_trait]
impl AudioSynthesisClient for ElevenLabsTtsRepository {
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        settings: ResolvedSettings,
    ) -> Result<SynthesisStream, SynthesisError> {
        let url = self.speech_url(voice_id)?;
        let speed = Self::provider_speed(settings.speed);
        if speed != settings.speed {
            tracing::debug!(
                requested_speed = settings.speed,
                speed = speed,
                "Speed clamped to the ElevenLabs range"
            );
        }

        tracing::info!(
            provider = "elevenlabs",
            model = %self.model_id,
            voice_id = voice_id,
            speed = speed,
            style = settings.style,
            text_length = text.chars().count(),
            "Calling ElevenLabs text-to-speech stream"
        );

        let request = SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: VoiceSettings {
                stability: STABILITY,
                similarity_boost: SIMILARITY_BOOST,
                style: settings.style,
                speed,
                use_speaker_boost: true,
            },
        };

        let response = self
            .http
            .post(url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice_id = voice_id, "ElevenLabs request failed");
                SynthesisError::Provider(format!("ElevenLabs request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = Self::map_error(status, &body, voice_id);
            tracing::error!(
                status = status.as_u16(),
                voice_id = voice_id,
                error = %error,
                "ElevenLabs rejected synthesis request"
            );
            return Err(error);
        }

        let stream = response.bytes_stream().map(|chunk| {
            chunk.map_err(|e| SynthesisError::Provider(format!("ElevenLabs stream broke: {}", e)))
        });

        Ok(stream.boxed())
    }
}

#[async_trait]
impl VoiceCatalogProvider for ElevenLabsTtsRepository {
    async fn list_voices(&self) -> Result<Vec<CatalogVoice>, SynthesisError> {
        let response = self
            .http
            .get(format!("{}/v1/voices", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| SynthesisError::Provider(format!("ElevenLabs voices request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisError::Provider(format!(
                "ElevenLabs voices returned {}: {}",
                status, body
            )));
        }

        let voices: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::Provider(format!("Invalid ElevenLabs voices payload: {}", e)))?;

        let catalog = Self::catalog_from_response(voices);
        tracing::debug!(catalog_size = catalog.len(), "ElevenLabs voice catalog fetched");

        Ok(catalog)
    }
}

/// Provider voice ids are short alphanumeric tokens
fn is_plain_voice_id(voice_id: &str) -> bool {
    !voice_id.is_empty()
        && voice_id.len() <= 64
        && voice_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

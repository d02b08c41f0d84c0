use super::synthesis_repository::{
    AudioSynthesisClient, CatalogVoice, SynthesisError, SynthesisStream, VoiceCatalogProvider,
};
use crate::domain::audio::ResolvedSettings;
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{CreateSpeechRequest, SpeechModel, Voice},
    Client,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use std::sync::Arc;

/// OpenAI voices with the language each one suits best
const VOICES: &[(&str, &str)] = &[
    ("alloy", "en"),   // Neutral American accent
    ("echo", "es"),    // Warm, clear for Spanish
    ("nova", "fr"),    // Soft, suitable for French
    ("onyx", "de"),    // Clear, authoritative
    ("fable", "it"),   // Expressive for Italian
    ("shimmer", "pt"), // Clear articulation
];

/// OpenAI TTS implementation of the synthesis client
pub struct OpenAiTtsRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTtsRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    fn parse_voice(voice_id: &str) -> Option<Voice> {
        match voice_id.to_lowercase().as_str() {
            "alloy" => Some(Voice::Alloy),
            "echo" => Some(Voice::Echo),
            "fable" => Some(Voice::Fable),
            "onyx" => Some(Voice::Onyx),
            "nova" => Some(Voice::Nova),
            "shimmer" => Some(Voice::Shimmer),
            _ => None,
        }
    }

    fn speech_model(&self) -> SpeechModel {
        match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        }
    }

    fn map_error(error: OpenAIError) -> SynthesisError {
        match error {
            OpenAIError::ApiError(api) => {
                let kind = api.r#type.clone().unwrap_or_default();
                if kind == "insufficient_quota" || api.message.contains("quota") {
                    SynthesisError::QuotaExceeded(api.message)
                } else {
                    SynthesisError::Provider(format!("OpenAI TTS error: {}", api.message))
                }
            }
            other => SynthesisError::Provider(format!("OpenAI TTS error: {}", other)),
        }
    }
}

#[async_trait]
impl AudioSynthesisClient for OpenAiTtsRepository {
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        settings: ResolvedSettings,
    ) -> Result<SynthesisStream, SynthesisError> {
        // Unknown names are rejected rather than silently swapped for another voice
        let voice = Self::parse_voice(voice_id).ok_or_else(|| SynthesisError::VoiceUnavailable {
            voice_id: voice_id.to_string(),
            message: "not an OpenAI voice".to_string(),
        })?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice_id = voice_id,
            speed = settings.speed,
            text_length = text.len(),
            "Calling OpenAI TTS API"
        );

        let request = CreateSpeechRequest {
            model: self.speech_model(),
            input: text.to_string(),
            voice,
            response_format: None, // Defaults to MP3
            speed: Some(settings.speed),
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                voice_id = voice_id,
                text_length = text.len(),
                "OpenAI TTS API call failed"
            );
            Self::map_error(e)
        })?;

        tracing::debug!(
            audio_size = response.bytes.len(),
            "OpenAI TTS audio received successfully"
        );

        // The speech endpoint answers with one complete body
        Ok(stream::iter(vec![Ok(response.bytes)]).boxed())
    }
}

#[async_trait]
impl VoiceCatalogProvider for OpenAiTtsRepository {
    async fn list_voices(&self) -> Result<Vec<CatalogVoice>, SynthesisError> {
        Ok(VOICES
            .iter()
            .map(|(voice_id, language)| CatalogVoice {
                voice_id: voice_id.to_string(),
                language_label: language.to_string(),
            })
            .collect())
    }
}

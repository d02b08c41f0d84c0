use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use vocab_audio_backend::domain::audio::ResolvedSettings;
use vocab_audio_backend::infrastructure::repositories::{
    AudioSynthesisClient, CatalogVoice, SynthesisError, SynthesisStream, VoiceCatalogProvider,
};

/// Voice ids that make the fake provider fail in a specific way
pub const QUOTA_VOICE: &str = "quota-voice";
pub const MISSING_VOICE: &str = "missing-voice";
pub const BROKEN_VOICE: &str = "broken-voice";

pub const ENGLISH_DEFAULT_VOICE: &str = "default-en";
pub const SPANISH_CATALOG_VOICE: &str = "catalog-es-1";

/// In-process speech provider: streams `ID3|<voice>|<text>` in two chunks
#[derive(Default)]
pub struct FakeSpeechProvider {
    synth_calls: AtomicUsize,
}

impl FakeSpeechProvider {
    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }

    pub fn expected_audio(voice_id: &str, text: &str) -> Vec<u8> {
        format!("ID3|{}|{}", voice_id, text).into_bytes()
    }
}

#[async_trait]
impl AudioSynthesisClient for FakeSpeechProvider {
    async fn synthesize(
        &self,
        voice_id: &str,
        text: &str,
        _settings: ResolvedSettings,
    ) -> Result<SynthesisStream, SynthesisError> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);

        match voice_id {
            QUOTA_VOICE => Err(SynthesisError::QuotaExceeded(
                "character quota exhausted".to_string(),
            )),
            MISSING_VOICE => Err(SynthesisError::VoiceUnavailable {
                voice_id: voice_id.to_string(),
                message: "voice not found".to_string(),
            }),
            BROKEN_VOICE => Ok(stream::iter(vec![
                Ok(Bytes::from_static(b"ID3")),
                Err(SynthesisError::Provider("connection reset".to_string())),
            ])
            .boxed()),
            _ => {
                let audio = Self::expected_audio(voice_id, text);
                let (head, tail) = audio.split_at(3);
                Ok(stream::iter(vec![
                    Ok(Bytes::copy_from_slice(head)),
                    Ok(Bytes::copy_from_slice(tail)),
                ])
                .boxed())
            }
        }
    }
}

#[async_trait]
impl VoiceCatalogProvider for FakeSpeechProvider {
    async fn list_voices(&self) -> Result<Vec<CatalogVoice>, SynthesisError> {
        Ok(vec![
            CatalogVoice {
                voice_id: SPANISH_CATALOG_VOICE.to_string(),
                language_label: "Spanish".to_string(),
            },
            CatalogVoice {
                voice_id: "catalog-es-2".to_string(),
                language_label: "es-MX".to_string(),
            },
        ])
    }
}

use crate::error::AppError;
use crate::infrastructure::repositories::{StorageError, SynthesisError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum AudioServiceError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("speech quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("voice {voice_id} is unavailable: {message}")]
    VoiceUnavailable { voice_id: String, message: String },
    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("audio storage error: {0}")]
    Storage(String),
    #[error("audio not found")]
    NotFound,
}

impl From<SynthesisError> for AudioServiceError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::QuotaExceeded(msg) => AudioServiceError::QuotaExceeded(msg),
            SynthesisError::VoiceUnavailable { voice_id, message } => {
                AudioServiceError::VoiceUnavailable { voice_id, message }
            }
            other @ SynthesisError::Timeout(_) => AudioServiceError::SynthesisFailed(other.to_string()),
            SynthesisError::Provider(msg) => AudioServiceError::SynthesisFailed(msg),
        }
    }
}

impl From<StorageError> for AudioServiceError {
    fn from(err: StorageError) -> Self {
        AudioServiceError::Storage(err.to_string())
    }
}

impl From<AudioServiceError> for AppError {
    fn from(err: AudioServiceError) -> Self {
        match err {
            AudioServiceError::Validation(msg) => AppError::BadRequest(msg),
            AudioServiceError::QuotaExceeded(msg) => AppError::RateLimitExceeded(msg),
            err @ AudioServiceError::VoiceUnavailable { .. } => {
                AppError::VoiceUnavailable(err.to_string())
            }
            AudioServiceError::SynthesisFailed(msg) => AppError::ExternalService(msg),
            AudioServiceError::Storage(msg) => AppError::Internal(msg),
            AudioServiceError::NotFound => AppError::NotFound("Audio not found".to_string()),
        }
    }
}

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    domain::audio::{AudioRequest, AudioServiceApi, CacheKey, GenerateAudioResponse},
    error::{AppError, AppResult},
    infrastructure::{http::request_id::RequestId, repositories::audio_store_repository::AUDIO_EXTENSION},
};

pub struct AudioController {
    audio_service: Arc<dyn AudioServiceApi>,
}

impl AudioController {
    pub fn new(audio_service: Arc<dyn AudioServiceApi>) -> Self {
        Self { audio_service }
    }

    /// POST /api/audio/generate - Pronunciation audio for a word or sentence
    pub async fn generate(
        State(controller): State<Arc<AudioController>>,
        Extension(request_id): Extension<RequestId>,
        payload: Result<Json<AudioRequest>, JsonRejection>,
    ) -> AppResult<Json<GenerateAudioResponse>> {
        let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

        let audio = controller
            .audio_service
            .generate_audio(request)
            .await
            .map_err(AppError::from)?;

        tracing::info!(
            request_id = %request_id.0,
            key = %audio.reference.key,
            cached = audio.cached,
            "Audio ready"
        );

        Ok(Json(audio.into()))
    }

    /// GET /api/audio/cache/:file - Stored audio by fingerprint (`<key>` or `<key>.mp3`)
    pub async fn get_cached(
        State(controller): State<Arc<AudioController>>,
        Path(file): Path<String>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let key = parse_file_name(&file)
            .ok_or_else(|| AppError::NotFound("Audio not found".to_string()))?;

        let audio = controller
            .audio_service
            .get_cached_audio(&key)
            .await
            .map_err(AppError::from)?;

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
        // Entries never change once written
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=604800, immutable"),
        );

        Ok((StatusCode::OK, headers, Body::from(audio)))
    }
}

fn parse_file_name(file: &str) -> Option<CacheKey> {
    let stem = file
        .strip_suffix(&format!(".{}", AUDIO_EXTENSION))
        .unwrap_or(file);
    CacheKey::parse(stem)
}

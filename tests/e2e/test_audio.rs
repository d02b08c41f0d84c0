use crate::e2e::helpers;

use helpers::fake_provider::{
    FakeSpeechProvider, BROKEN_VOICE, ENGLISH_DEFAULT_VOICE, MISSING_VOICE, QUOTA_VOICE,
    SPANISH_CATALOG_VOICE,
};
use helpers::TestContext;
use hyper::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_context::test_context;
use vocab_audio_backend::domain::audio::{CacheKey, GenerateAudioResponse};

const GENERATE: &str = "/api/audio/generate";

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_generate_audio_on_first_request(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "hola", "language": "es" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let audio: GenerateAudioResponse = response.json().unwrap();

    let expected_key = CacheKey::derive("hola", SPANISH_CATALOG_VOICE, 1.0);
    assert_eq!(audio.key, expected_key.to_string());
    assert_eq!(audio.audio_url, format!("/api/audio/cache/{}.mp3", expected_key));
    assert_eq!(audio.voice_id, SPANISH_CATALOG_VOICE);
    assert_eq!(audio.language, "es");
    assert!(!audio.cached);
    assert_eq!(ctx.provider.synth_calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_serve_repeated_requests_from_cache(ctx: &TestContext) {
    let body = json!({ "text": "good morning", "language": "en" });

    let first: GenerateAudioResponse = ctx.client.post(GENERATE, &body).await.unwrap().json().unwrap();
    let second: GenerateAudioResponse = ctx.client.post(GENERATE, &body).await.unwrap().json().unwrap();

    assert!(!first.cached);
    assert!(second.cached);
    assert_eq!(first.audio_url, second.audio_url);
    assert_eq!(ctx.provider.synth_calls(), 1);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_camel_case_fields(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "apple" }))
        .await
        .unwrap();

    response.assert_status(StatusCode::OK);
    let body = response.body.as_ref().unwrap();
    for field in ["audioUrl", "key", "voiceId", "language", "cached"] {
        assert!(body.get(field).is_some(), "Missing field '{}' in {}", field, body);
    }
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_download_generated_audio(ctx: &TestContext) {
    let audio: GenerateAudioResponse = ctx
        .client
        .post(GENERATE, &json!({ "text": "bonjour", "language": "fr" }))
        .await
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(audio.voice_id, "default-fr");

    let response = ctx.client.get(&audio.audio_url).await.unwrap();

    response
        .assert_status(StatusCode::OK)
        .assert_header("content-type", "audio/mpeg");
    assert_eq!(
        response.body_bytes,
        FakeSpeechProvider::expected_audio("default-fr", "bonjour")
    );

    // The bare fingerprint works too
    let response = ctx
        .client
        .get(&format!("/api/audio/cache/{}", audio.key))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_return_404_for_unknown_audio(ctx: &TestContext) {
    let missing = CacheKey::derive("never generated", ENGLISH_DEFAULT_VOICE, 1.0);

    let response = ctx
        .client
        .get(&format!("/api/audio/cache/{}.mp3", missing))
        .await
        .unwrap();
    response.assert_status(StatusCode::NOT_FOUND).assert_error_code("not_found");

    let response = ctx.client.get("/api/audio/cache/not-a-key.mp3").await.unwrap();
    response.assert_status(StatusCode::NOT_FOUND);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_fall_back_to_english_voice_for_unknown_language(ctx: &TestContext) {
    let audio: GenerateAudioResponse = ctx
        .client
        .post(GENERATE, &json!({ "text": "word", "language": "xx" }))
        .await
        .unwrap()
        .json()
        .unwrap();

    assert_eq!(audio.language, "xx");
    assert_eq!(audio.voice_id, ENGLISH_DEFAULT_VOICE);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_prefer_explicit_voice(ctx: &TestContext) {
    let audio: GenerateAudioResponse = ctx
        .client
        .post(
            GENERATE,
            &json!({ "text": "hola", "language": "es", "voice": "my-voice" }),
        )
        .await
        .unwrap()
        .json()
        .unwrap();

    assert_eq!(audio.voice_id, "my-voice");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_blank_text(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "   " }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("validation_error");
    assert_eq!(ctx.provider.synth_calls(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_enforce_text_length_limit(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "a".repeat(2501) }))
        .await
        .unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("validation_error");

    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "a".repeat(2500) }))
        .await
        .unwrap();
    response.assert_status(StatusCode::OK);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_speed_out_of_range(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "fast", "speed": 3.0 }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("validation_error");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_reject_malformed_payload(ctx: &TestContext) {
    let response = ctx.client.post_raw(GENERATE, "{\"voice\": 42").await.unwrap();
    response
        .assert_status(StatusCode::BAD_REQUEST)
        .assert_error_code("validation_error");

    let response = ctx
        .client
        .post(GENERATE, &json!({ "language": "en" }))
        .await
        .unwrap();
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_map_quota_errors_to_429(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "hello", "voice": QUOTA_VOICE }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::TOO_MANY_REQUESTS)
        .assert_error_code("quota_exceeded");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_map_unknown_voice_to_422(ctx: &TestContext) {
    let response = ctx
        .client
        .post(GENERATE, &json!({ "text": "hello", "voice": MISSING_VOICE }))
        .await
        .unwrap();

    response
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY)
        .assert_error_code("voice_unavailable");
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_not_cache_failed_synthesis(ctx: &TestContext) {
    let body = json!({ "text": "hello", "voice": BROKEN_VOICE });

    let response = ctx.client.post(GENERATE, &body).await.unwrap();
    response
        .assert_status(StatusCode::INTERNAL_SERVER_ERROR)
        .assert_error_code("synthesis_failed");

    let key = CacheKey::derive("hello", BROKEN_VOICE, 1.0);
    let response = ctx
        .client
        .get(&format!("/api/audio/cache/{}.mp3", key))
        .await
        .unwrap();
    response.assert_status(StatusCode::NOT_FOUND);

    // Retried, not served from a poisoned entry
    ctx.client.post(GENERATE, &body).await.unwrap();
    assert_eq!(ctx.provider.synth_calls(), 2);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_store_one_file_per_fingerprint(ctx: &TestContext) {
    for text in ["one", "two", "one"] {
        ctx.client
            .post(GENERATE, &json!({ "text": text }))
            .await
            .unwrap()
            .assert_status(StatusCode::OK);
    }

    let files: Vec<String> = std::fs::read_dir(ctx.store_root())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.ends_with(".mp3")));
}

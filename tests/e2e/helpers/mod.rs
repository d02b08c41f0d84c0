use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use vocab_audio_backend::controllers::audio::AudioController;
use vocab_audio_backend::domain::audio::{
    AudioService, DefaultVoiceTable, SystemClock, VoiceCatalogCache, VoiceResolver,
};
use vocab_audio_backend::infrastructure::http::build_router;
use vocab_audio_backend::infrastructure::repositories::{
    FileContentStore, NoopUserLanguageRepository,
};

pub mod fake_provider;

use api_client::TestClient;
use fake_provider::{FakeSpeechProvider, ENGLISH_DEFAULT_VOICE};

pub struct TestContext {
    pub client: TestClient,
    pub provider: Arc<FakeSpeechProvider>,
    store_root: PathBuf,
    server: JoinHandle<()>,
    _dir: TempDir,
}

impl TestContext {
    /// Directory backing the audio store
    pub fn store_root(&self) -> &Path {
        &self.store_root
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let store_root = dir.path().join("audio");
            let store = Arc::new(
                FileContentStore::open(&store_root, "/api/audio/cache")
                    .await
                    .expect("Failed to open audio store"),
            );

            // Speech provider is faked in-process
            let provider = Arc::new(FakeSpeechProvider::default());
            let catalog = Arc::new(VoiceCatalogCache::new(
                provider.clone(),
                Arc::new(SystemClock),
                Duration::from_secs(3600),
            ));
            let defaults = DefaultVoiceTable::new(ENGLISH_DEFAULT_VOICE).with_voice("fr", "default-fr");

            let audio_service = Arc::new(AudioService::new(
                store.clone(),
                provider.clone(),
                VoiceResolver::new(catalog, defaults),
                Arc::new(NoopUserLanguageRepository),
                Duration::from_secs(5),
            ));
            let app = build_router(Arc::new(AudioController::new(audio_service)), store);

            // Start server
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind listener");
            let addr = listener.local_addr().expect("Failed to get local addr");
            let base_url = format!("http://{}", addr);

            let server = tokio::spawn(async move {
                axum::serve(listener, app).await.unwrap();
            });

            Self {
                client: TestClient::new(&base_url),
                provider,
                store_root,
                server,
                _dir: dir,
            }
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async move {
            self.server.abort();
        }
    }
}

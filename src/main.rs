use async_openai::{config::OpenAIConfig, Client};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_audio_backend::controllers::audio::AudioController;
use vocab_audio_backend::domain::audio::{
    AudioService, CacheEvictor, DefaultVoiceTable, SystemClock, VoiceCatalogCache, VoiceResolver,
};
use vocab_audio_backend::infrastructure::config::{Config, LogFormat, ProviderConfig};
use vocab_audio_backend::infrastructure::db;
use vocab_audio_backend::infrastructure::http::{build_router, start_http_server};
use vocab_audio_backend::infrastructure::repositories::{
    AudioSynthesisClient, ElevenLabsTtsRepository, FileContentStore, NoopUserLanguageRepository,
    OpenAiTtsRepository, PgUserLanguageRepository, UserLanguagePreferenceLookup,
    VoiceCatalogProvider,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        development = config.is_development(),
        "Starting Vocab Audio Backend on {}:{}",
        config.host,
        config.port
    );

    // Audio store
    let store = Arc::new(
        FileContentStore::open(&config.audio_cache_dir, &config.audio_cache_url_prefix).await?,
    );

    // Speech provider
    let (synthesizer, catalog_provider, defaults): (
        Arc<dyn AudioSynthesisClient>,
        Arc<dyn VoiceCatalogProvider>,
        DefaultVoiceTable,
    ) = match &config.provider {
        ProviderConfig::ElevenLabs {
            api_key,
            model_id,
            base_url,
        } => {
            tracing::info!(model_id = %model_id, "Using ElevenLabs speech provider");
            let repo = Arc::new(ElevenLabsTtsRepository::new(
                api_key.clone(),
                model_id.clone(),
                base_url.clone(),
            ));
            (
                repo.clone() as Arc<dyn AudioSynthesisClient>,
                repo as Arc<dyn VoiceCatalogProvider>,
                DefaultVoiceTable::elevenlabs(),
            )
        }
        ProviderConfig::OpenAi { api_key, model } => {
            tracing::info!(model = %model, "Using OpenAI speech provider");
            let client = Arc::new(Client::with_config(
                OpenAIConfig::new().with_api_key(api_key.clone()),
            ));
            let repo = Arc::new(OpenAiTtsRepository::new(client, model.clone()));
            (
                repo.clone() as Arc<dyn AudioSynthesisClient>,
                repo as Arc<dyn VoiceCatalogProvider>,
                DefaultVoiceTable::openai(),
            )
        }
    };

    // Learner language lookup
    let user_languages: Arc<dyn UserLanguagePreferenceLookup> = match &config.database_url {
        Some(url) => {
            let pool = Arc::new(db::connect(url).await?);
            Arc::new(PgUserLanguageRepository::new(pool))
        }
        None => {
            tracing::info!("DATABASE_URL not set, learner language lookup disabled");
            Arc::new(NoopUserLanguageRepository)
        }
    };

    // === DEPENDENCY INJECTION SETUP ===
    let clock = Arc::new(SystemClock);
    let catalog = Arc::new(VoiceCatalogCache::new(
        catalog_provider,
        clock.clone(),
        config.voice_catalog_ttl,
    ));
    let audio_service = Arc::new(AudioService::new(
        store.clone(),
        synthesizer,
        VoiceResolver::new(catalog, defaults),
        user_languages,
        config.synthesis_timeout,
    ));
    let audio_controller = Arc::new(AudioController::new(audio_service));

    // Background eviction
    let evictor = Arc::new(CacheEvictor::new(store.clone(), clock));
    let _sweeper = evictor.spawn_periodic(
        config.audio_cache_sweep_interval,
        config.audio_cache_max_age,
    );
    tracing::info!(
        interval_secs = config.audio_cache_sweep_interval.as_secs(),
        max_age_days = config.audio_cache_max_age.as_secs() / 86_400,
        "Audio cache eviction scheduled"
    );

    let app = build_router(audio_controller, store);
    start_http_server(Arc::new(config), app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vocab_audio_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

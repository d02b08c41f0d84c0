use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    pub provider: ProviderConfig,
    // Audio store
    pub audio_cache_dir: PathBuf,
    pub audio_cache_url_prefix: String,
    pub audio_cache_max_age: Duration,
    pub audio_cache_sweep_interval: Duration,
    // Voice catalog and synthesis
    pub voice_catalog_ttl: Duration,
    pub synthesis_timeout: Duration,
    /// Enables learner language lookup when set
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Speech provider selected by `TTS_PROVIDER`
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    ElevenLabs {
        api_key: String,
        model_id: String,
        base_url: String,
    },
    OpenAi {
        api_key: String,
        model: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let provider = match env::var("TTS_PROVIDER")
            .unwrap_or_else(|_| "elevenlabs".to_string())
            .to_lowercase()
            .as_str()
        {
            "elevenlabs" => ProviderConfig::ElevenLabs {
                api_key: required("ELEVENLABS_API_KEY")?,
                model_id: env::var("ELEVENLABS_MODEL_ID")
                    .unwrap_or_else(|_| "eleven_multilingual_v2".to_string()),
                base_url: env::var("ELEVENLABS_BASE_URL")
                    .unwrap_or_else(|_| "https://api.elevenlabs.io".to_string()),
            },
            "openai" => ProviderConfig::OpenAi {
                api_key: required("OPENAI_API_KEY")?,
                model: env::var("OPENAI_TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            },
            other => return Err(format!("Unsupported TTS_PROVIDER: {}", other).into()),
        };

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            provider,
            audio_cache_dir: env::var("AUDIO_CACHE_DIR")
                .unwrap_or_else(|_| "./audio-cache".to_string())
                .into(),
            audio_cache_url_prefix: env::var("AUDIO_CACHE_URL_PREFIX")
                .unwrap_or_else(|_| "/api/audio/cache".to_string()),
            audio_cache_max_age: Duration::from_secs(
                parse_or("AUDIO_CACHE_MAX_AGE_DAYS", 7u64)? * 24 * 60 * 60,
            ),
            audio_cache_sweep_interval: Duration::from_secs(parse_or(
                "AUDIO_CACHE_SWEEP_INTERVAL_SECS",
                3600u64,
            )?),
            voice_catalog_ttl: Duration::from_secs(
                parse_or("VOICE_CATALOG_TTL_HOURS", 24u64)? * 60 * 60,
            ),
            synthesis_timeout: Duration::from_secs(parse_or("SYNTHESIS_TIMEOUT_SECS", 30u64)?),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
        };

        if config.audio_cache_sweep_interval.is_zero() {
            return Err("AUDIO_CACHE_SWEEP_INTERVAL_SECS must be greater than zero".into());
        }

        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn required(name: &str) -> Result<String, String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| format!("{} must be set", name))
}

fn parse_or<T>(name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("Invalid {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}

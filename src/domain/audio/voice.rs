use super::clock::Clock;
use super::language::{language_aliases, normalize_language, DefaultVoiceTable};
use crate::infrastructure::repositories::{CatalogVoice, VoiceCatalogProvider};
use chrono::{DateTime, Utc};
use moka::future::Cache;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

/// How long a fetched catalog entry is trusted
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Voices kept per language, in provider rank order
pub const MAX_CATALOG_VOICES: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceCatalogEntry {
    pub language: String,
    pub voice_ids: Vec<String>,
    pub fetched_at: DateTime<Utc>,
}

/// TTL-bounded "language -> known voices" cache over an external catalog.
///
/// Refreshes are single-flight per language: concurrent callers for a stale
/// language share one provider call. A failed refresh serves the previous
/// entry (even stale) or nothing.
pub struct VoiceCatalogCache {
    provider: Arc<dyn VoiceCatalogProvider>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: RwLock<HashMap<String, VoiceCatalogEntry>>,
    refreshes: Cache<String, Vec<String>>,
}

impl VoiceCatalogCache {
    pub fn new(provider: Arc<dyn VoiceCatalogProvider>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            provider,
            clock,
            ttl,
            entries: RwLock::new(HashMap::new()),
            refreshes: Cache::builder().max_capacity(256).build(),
        }
    }

    /// Ranked voices for a language, possibly empty
    pub async fn voices_for(&self, language: &str) -> Vec<String> {
        if let Some(entry) = self.entry(language) {
            if self.is_fresh(&entry) {
                return entry.voice_ids;
            }
        }

        let voices = self
            .refreshes
            .get_with(language.to_string(), self.refresh(language))
            .await;
        self.refreshes.invalidate(language).await;

        voices
    }

    /// Snapshot of the cached entry, fresh or not
    pub fn entry(&self, language: &str) -> Option<VoiceCatalogEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(language)
            .cloned()
    }

    fn is_fresh(&self, entry: &VoiceCatalogEntry) -> bool {
        // A clock that went backwards keeps the entry
        self.clock
            .now()
            .signed_duration_since(entry.fetched_at)
            .to_std()
            .map(|age| age < self.ttl)
            .unwrap_or(true)
    }

    async fn refresh(&self, language: &str) -> Vec<String> {
        match self.provider.list_voices().await {
            Ok(catalog) => {
                let voice_ids = select_voices(&catalog, language);
                tracing::info!(
                    language = language,
                    catalog_size = catalog.len(),
                    voice_count = voice_ids.len(),
                    "Voice catalog refreshed"
                );

                let entry = VoiceCatalogEntry {
                    language: language.to_string(),
                    voice_ids: voice_ids.clone(),
                    fetched_at: self.clock.now(),
                };
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(language.to_string(), entry);

                voice_ids
            }
            Err(e) => {
                let previous = self
                    .entry(language)
                    .map(|entry| entry.voice_ids)
                    .unwrap_or_default();
                tracing::warn!(
                    language = language,
                    error = %e,
                    fallback_voice_count = previous.len(),
                    "Voice catalog refresh failed, serving previous entry"
                );
                previous
            }
        }
    }
}

/// Does a provider label name this language?
/// Exact code match (region ignored) or a family alias inside the label.
fn label_matches(label: &str, language: &str) -> bool {
    if normalize_language(label).as_deref() == Some(language) {
        return true;
    }

    let label = label.to_lowercase();
    language_aliases(language)
        .iter()
        .any(|alias| label.contains(alias))
}

/// First distinct matching voices, provider order preserved
fn select_voices(catalog: &[CatalogVoice], language: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    catalog
        .iter()
        .filter(|voice| label_matches(&voice.language_label, language))
        .filter(|voice| seen.insert(voice.voice_id.clone()))
        .take(MAX_CATALOG_VOICES)
        .map(|voice| voice.voice_id.clone())
        .collect()
}

/// Picks one voice for a language. Never fails.
pub struct VoiceResolver {
    catalog: Arc<VoiceCatalogCache>,
    defaults: DefaultVoiceTable,
}

impl VoiceResolver {
    pub fn new(catalog: Arc<VoiceCatalogCache>, defaults: DefaultVoiceTable) -> Self {
        Self { catalog, defaults }
    }

    /// Explicit voice, then best catalog voice, then the language default,
    /// then the English default
    pub async fn resolve(&self, language: &str, explicit_voice: Option<&str>) -> String {
        if let Some(voice) = explicit_voice.map(str::trim).filter(|v| !v.is_empty()) {
            return voice.to_string();
        }

        if let Some(voice) = self.catalog.voices_for(language).await.into_iter().next() {
            return voice;
        }

        if let Some(voice) = self.defaults.get(language) {
            tracing::debug!(language = language, voice_id = voice, "Using default voice for language");
            return voice.to_string();
        }

        tracing::debug!(language = language, "No voice for language, using English default");
        self.defaults.english().to_string()
    }
}

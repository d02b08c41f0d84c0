pub mod audio_store_repository;
pub mod elevenlabs_tts_repository;
pub mod openai_tts_repository;
pub mod synthesis_repository;
pub mod user_language_repository;

pub use audio_store_repository::{
    AbandonedWrites, ContentStore, FileContentStore, StorageError, StoredEntry,
};
pub use elevenlabs_tts_repository::ElevenLabsTtsRepository;
pub use openai_tts_repository::OpenAiTtsRepository;
pub use synthesis_repository::{
    AudioSynthesisClient, CatalogVoice, SynthesisError, SynthesisStream, VoiceCatalogProvider,
};
pub use user_language_repository::{
    NoopUserLanguageRepository, PgUserLanguageRepository, UserLanguagePreferenceLookup,
};

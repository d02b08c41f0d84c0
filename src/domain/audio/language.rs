use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Language used when neither the request nor the user says otherwise
pub const DEFAULT_LANGUAGE: &str = "en";

/// Speed used for languages without a learner override
pub const DEFAULT_SPEED: f32 = 1.0;

fn language_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{2,3})(?:[-_][A-Za-z0-9]{1,8})*$")
            .expect("language tag pattern is valid")
    })
}

/// Reduce a language tag to its lowercase primary subtag.
///
/// `pt-BR` becomes `pt`, `zh_Hans` becomes `zh`. Blank or malformed tags
/// return `None` so the caller falls through to its next source.
pub fn normalize_language(raw: &str) -> Option<String> {
    let captures = language_tag_pattern().captures(raw.trim())?;
    captures.get(1).map(|m| m.as_str().to_lowercase())
}

/// Provider label spellings that identify a language family
pub fn language_aliases(language: &str) -> &'static [&'static str] {
    match language {
        "en" => &["english"],
        "es" => &["spanish", "castilian"],
        "fr" => &["french"],
        "de" => &["german"],
        "it" => &["italian"],
        "pt" => &["portuguese", "brazilian"],
        "nl" => &["dutch"],
        "pl" => &["polish"],
        "sv" => &["swedish"],
        "tr" => &["turkish"],
        "ru" => &["russian"],
        "ar" => &["arabic"],
        "hi" => &["hindi"],
        "zh" => &["chinese", "mandarin", "cantonese"],
        "ja" => &["japanese"],
        "ko" => &["korean"],
        "vi" => &["vietnamese"],
        "th" => &["thai"],
        _ => &[],
    }
}

/// Synthesis settings after per-language and per-request resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSettings {
    pub speed: f32,
    pub style: f32,
}

/// Learner overrides: slower articulation and some style intensity for
/// tonal languages and unfamiliar phoneme inventories
fn learner_overrides(language: &str) -> Option<ResolvedSettings> {
    let (speed, style) = match language {
        "zh" => (0.8, 0.3),
        "vi" => (0.8, 0.3),
        "th" => (0.8, 0.3),
        "ja" => (0.85, 0.25),
        "ko" => (0.85, 0.25),
        "ar" => (0.85, 0.2),
        "hi" => (0.9, 0.15),
        "ru" => (0.9, 0.15),
        _ => return None,
    };

    Some(ResolvedSettings { speed, style })
}

/// Resolve speed and style for a language.
/// An explicit speed wins over the table; style is never caller-controlled.
pub fn settings_for(language: &str, requested_speed: Option<f32>) -> ResolvedSettings {
    match learner_overrides(language) {
        Some(table) => ResolvedSettings {
            speed: requested_speed.unwrap_or(table.speed),
            style: table.style,
        },
        None => ResolvedSettings {
            speed: requested_speed.unwrap_or(DEFAULT_SPEED),
            style: 0.0,
        },
    }
}

/// Last-resort voice per language. Always has an English entry.
#[derive(Debug, Clone)]
pub struct DefaultVoiceTable {
    english: String,
    voices: HashMap<String, String>,
}

impl DefaultVoiceTable {
    pub fn new(english_voice: impl Into<String>) -> Self {
        Self {
            english: english_voice.into(),
            voices: HashMap::new(),
        }
    }

    pub fn with_voice(mut self, language: &str, voice_id: impl Into<String>) -> Self {
        if language == DEFAULT_LANGUAGE {
            self.english = voice_id.into();
        } else {
            self.voices.insert(language.to_string(), voice_id.into());
        }
        self
    }

    pub fn get(&self, language: &str) -> Option<&str> {
        if language == DEFAULT_LANGUAGE {
            return Some(&self.english);
        }
        self.voices.get(language).map(String::as_str)
    }

    pub fn english(&self) -> &str {
        &self.english
    }

    /// ElevenLabs premade voices; all of them speak every language of the
    /// multilingual model, the choice per language is about timbre only
    pub fn elevenlabs() -> Self {
        Self::new("21m00Tcm4TlvDq8ikWAM") // Rachel
            .with_voice("es", "ErXwobaYiN019PkySvjV") // Antoni
            .with_voice("fr", "EXAVITQu4vr4xnSDxMaL") // Bella
            .with_voice("de", "pNInz6obpgDQGcFmaJgB") // Adam
            .with_voice("it", "AZnzlk1XvdvUeBnXmlld") // Domi
            .with_voice("pt", "TxGEqnHWrfWFTfGW9XjX") // Josh
            .with_voice("ja", "MF3mGyEYCl7XYWbV9V6O") // Elli
            .with_voice("zh", "MF3mGyEYCl7XYWbV9V6O")
            .with_voice("ko", "MF3mGyEYCl7XYWbV9V6O")
    }

    /// OpenAI's fixed voice set
    pub fn openai() -> Self {
        Self::new("alloy")
            .with_voice("es", "echo")
            .with_voice("fr", "nova")
            .with_voice("de", "onyx")
            .with_voice("it", "fable")
            .with_voice("pt", "shimmer")
    }
}

use serde::{Deserialize, Serialize};

/// Length of a rendered fingerprint (MD5, lowercase hex)
pub const CACHE_KEY_LEN: usize = 32;

/// Fingerprint identifying one (text, voice, speed) synthesis
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the fingerprint for a synthesis request.
    ///
    /// Text is hashed verbatim. Text and voice are length-prefixed so no
    /// choice of characters can make two different inputs share material.
    pub fn derive(text: &str, voice_id: &str, speed: f32) -> Self {
        let material = format!(
            "{}:{}{}:{}|{}",
            text.len(),
            text,
            voice_id.len(),
            voice_id,
            speed
        );
        let digest = md5::compute(material.as_bytes());
        Self(format!("{:x}", digest))
    }

    /// Parse a key received from outside (HTTP path, file name).
    /// Only well-formed 32-char lowercase hex strings are accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == CACHE_KEY_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));

        well_formed.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

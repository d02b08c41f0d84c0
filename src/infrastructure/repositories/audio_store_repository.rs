use crate::domain::audio::{AudioReference, CacheKey};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, DirEntry, ReadDir};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Extension of every stored audio file
pub const AUDIO_EXTENSION: &str = "mp3";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("audio store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot list audio store: {0}")]
    Listing(std::io::Error),
}

/// A stored audio entry as seen by eviction and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub key: CacheKey,
    pub byte_length: u64,
    pub last_modified: DateTime<Utc>,
}

/// Content-addressed audio storage keyed by [`CacheKey`].
///
/// Entries are immutable once written. A reader never observes a partially
/// written entry: `put` must commit atomically.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Public reference for a key, whether or not it is stored
    fn reference(&self, key: &CacheKey) -> AudioReference;

    async fn exists(&self, key: &CacheKey) -> Result<bool, StorageError>;

    /// `Ok(None)` on a miss
    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StorageError>;

    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<AudioReference, StorageError>;

    /// Lazily walk all stored entries
    fn entries(&self) -> BoxStream<'static, Result<StoredEntry, StorageError>>;

    /// Returns `false` when the entry was already gone
    async fn delete(&self, key: &CacheKey) -> Result<bool, StorageError>;

    /// Remove leftovers of writes that never committed, last touched before
    /// `cutoff`. Returns how many were removed and their total size.
    async fn purge_abandoned_writes(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<AbandonedWrites, StorageError>;
}

/// Outcome of [`ContentStore::purge_abandoned_writes`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbandonedWrites {
    pub removed: usize,
    pub bytes_freed: u64,
}

/// Flat directory of `<fingerprint>.mp3` files
pub struct FileContentStore {
    root: PathBuf,
    url_prefix: String,
}

impl FileContentStore {
    /// Open the store, creating its directory when missing
    pub async fn open(
        root: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).await?;

        tracing::info!(root = %root.display(), "Audio store opened");

        Ok(Self {
            root,
            url_prefix: url_prefix.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{}.{}", key, AUDIO_EXTENSION))
    }

    /// Temp files are hidden so directory walks skip them
    fn temp_path(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()))
    }
}

#[async_trait]
impl ContentStore for FileContentStore {
    fn reference(&self, key: &CacheKey) -> AudioReference {
        AudioReference {
            key: key.clone(),
            url: format!("{}/{}.{}", self.url_prefix, key, AUDIO_EXTENSION),
        }
    }

    async fn exists(&self, key: &CacheKey) -> Result<bool, StorageError> {
        match fs::metadata(self.entry_path(key)).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(self.entry_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<AudioReference, StorageError> {
        if self.exists(key).await? {
            tracing::debug!(key = %key, "Audio entry already stored, keeping existing file");
            return Ok(self.reference(key));
        }

        let temp_path = self.temp_path(key);
        if let Err(e) = write_atomically(&temp_path, &self.entry_path(key), bytes).await {
            // The temp file may not exist if creation itself failed
            let _ = fs::remove_file(&temp_path).await;
            tracing::error!(key = %key, error = %e, "Failed to store audio entry");
            return Err(e.into());
        }

        tracing::debug!(key = %key, size_bytes = bytes.len(), "Audio entry stored");

        Ok(self.reference(key))
    }

    fn entries(&self) -> BoxStream<'static, Result<StoredEntry, StorageError>> {
        stream::unfold(Walk::Start(self.root.clone()), next_entry).boxed()
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, StorageError> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn purge_abandoned_writes(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<AbandonedWrites, StorageError> {
        let mut purged = AbandonedWrites::default();
        let mut dir = fs::read_dir(&self.root).await.map_err(StorageError::Listing)?;

        while let Some(entry) = dir.next_entry().await.map_err(StorageError::Listing)? {
            let file_name = entry.file_name();
            if !file_name.to_str().is_some_and(is_temp_file_name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                // Committed or cleaned up meanwhile
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() || DateTime::<Utc>::from(metadata.modified()?) >= cutoff {
                continue;
            }

            match fs::remove_file(entry.path()).await {
                Ok(()) => {
                    purged.removed += 1;
                    purged.bytes_freed += metadata.len();
                    tracing::debug!(file = ?file_name, "Removed abandoned audio write");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(purged)
    }
}

/// `.<key>.<uuid>.tmp`, as produced by `FileContentStore::temp_path`
fn is_temp_file_name(name: &str) -> bool {
    name.strip_prefix('.')
        .and_then(|rest| rest.strip_suffix(".tmp"))
        .and_then(|rest| rest.split_once('.'))
        .is_some_and(|(key, id)| CacheKey::parse(key).is_some() && Uuid::parse_str(id).is_ok())
}

/// Write to a sibling temp file, flush to disk, then rename into place
async fn write_atomically(temp_path: &Path, dest: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp_path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(temp_path, dest).await
}

enum Walk {
    Start(PathBuf),
    Reading(ReadDir),
    Done,
}

async fn next_entry(state: Walk) -> Option<(Result<StoredEntry, StorageError>, Walk)> {
    let mut dir = match state {
        Walk::Start(root) => match fs::read_dir(&root).await {
            Ok(dir) => dir,
            Err(e) => return Some((Err(StorageError::Listing(e)), Walk::Done)),
        },
        Walk::Reading(dir) => dir,
        Walk::Done => return None,
    };

    loop {
        match dir.next_entry().await {
            Ok(Some(entry)) => match stored_entry(&entry).await {
                Ok(Some(stored)) => return Some((Ok(stored), Walk::Reading(dir))),
                Ok(None) => continue,
                Err(e) => return Some((Err(e), Walk::Reading(dir))),
            },
            Ok(None) => return None,
            Err(e) => return Some((Err(StorageError::Listing(e)), Walk::Done)),
        }
    }
}

/// `None` for temp files, foreign files, and entries deleted mid-walk
async fn stored_entry(entry: &DirEntry) -> Result<Option<StoredEntry>, StorageError> {
    let file_name = entry.file_name();
    let Some(key) = file_name
        .to_str()
        .and_then(|name| name.strip_suffix(&format!(".{}", AUDIO_EXTENSION)))
        .and_then(CacheKey::parse)
    else {
        return Ok(None);
    };

    let metadata = match entry.metadata().await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if !metadata.is_file() {
        return Ok(None);
    }

    Ok(Some(StoredEntry {
        key,
        byte_length: metadata.len(),
        last_modified: DateTime::<Utc>::from(metadata.modified()?),
    }))
}

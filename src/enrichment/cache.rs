use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed writing cache file: {0}")]
    Io(#[from] io::Error),
    #[error("Failed serializing cache: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Narrow key-value interface the enrichment collaborators cache through.
///
/// A hit or a miss may only change latency, never what the caller ends up with.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    async fn flush(&self) -> Result<(), CacheError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheEntry {
    value: Value,
    cached_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CacheFile {
    version: u32,
    ttl_seconds: i64,
    entries: BTreeMap<String, CacheEntry>,
}

/// Versioned JSON side file; stale entries and files of another version read as misses.
pub struct JsonFileCache {
    path: PathBuf,
    version: u32,
    ttl: Duration,
    entries: Mutex<BTreeMap<String, CacheEntry>>,
}

impl JsonFileCache {
    pub fn empty(path: &Path, version: u32, ttl: Duration) -> Self {
        Self {
            path: path.to_path_buf(),
            version,
            ttl,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Unreadable or outdated files are discarded; caching is never worth failing a run over.
    #[tracing::instrument(skip(ttl))]
    pub async fn load(path: &Path, version: u32, ttl: Duration) -> Self {
        let cache = Self::empty(path, version, ttl);

        let json = match tokio::fs::read_to_string(path).await {
            Ok(json) => json,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!("Couldn't read cache, starting empty: {}", err);
                }
                return cache;
            }
        };

        match serde_json::from_str::<CacheFile>(&json) {
            Ok(file) if file.version == version => {
                let now = Utc::now();
                let fresh: BTreeMap<String, CacheEntry> = file
                    .entries
                    .into_iter()
                    .filter(|(_, entry)| now - entry.cached_at < ttl)
                    .collect();

                info!("Loaded {} cached entries", fresh.len());

                if let Ok(mut entries) = cache.entries.lock() {
                    *entries = fresh;
                }
            }
            Ok(file) => {
                info!(
                    "Cache version {} doesn't match {}, starting empty",
                    file.version, version
                );
            }
            Err(err) => {
                warn!("Invalid cache file, starting empty: {}", err);
            }
        }

        cache
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KeyValueStore for JsonFileCache {
    fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;

        if Utc::now() - entry.cached_at >= self.ttl {
            debug!("Cache entry '{}' expired", key);
            return None;
        }

        Some(entry.value.clone())
    }

    fn set(&self, key: &str, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.to_string(),
                CacheEntry {
                    value,
                    cached_at: Utc::now(),
                },
            );
        }
    }

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn flush(&self) -> Result<(), CacheError> {
        let file = CacheFile {
            version: self.version,
            ttl_seconds: self.ttl.num_seconds(),
            entries: self
                .entries
                .lock()
                .map(|entries| entries.clone())
                .unwrap_or_default(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, json).await?;

        debug!("Flushed {} cache entries", file.entries.len());

        Ok(())
    }
}

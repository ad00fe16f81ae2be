//! Snapshot read/write operations.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::key::{CacheIdentity, cache_key};
use crate::snapshot::{PageSnapshot, now_rfc3339};
use crate::Error;

/// On-disk envelope around a cached snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSnapshot {
    pub key: String,
    pub identity: CacheIdentity,
    pub cached_at: String,
    pub snapshot: PageSnapshot,
}

impl CachedSnapshot {
    /// Whether this entry was produced for the given URL and selector.
    pub fn matches(&self, url: &str, selector: &str) -> bool {
        self.snapshot.source_url == url && self.snapshot.selector == selector
    }
}

/// Cache directory handle.
#[derive(Clone, Debug)]
pub struct SnapshotCache {
    dir: PathBuf,
}

impl SnapshotCache {
    /// Open the cache rooted at `dir`, creating the directory if needed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::Cache(format!("failed to create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the JSON file for an identity.
    pub fn path_for(&self, identity: &CacheIdentity) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(identity)))
    }

    /// Write a snapshot, replacing any previous entry for the identity.
    pub async fn put(&self, identity: &CacheIdentity, snapshot: &PageSnapshot) -> Result<PathBuf, Error> {
        let entry = CachedSnapshot {
            key: cache_key(identity),
            identity: identity.clone(),
            cached_at: now_rfc3339(),
            snapshot: snapshot.clone(),
        };
        let json = serde_json::to_string_pretty(&entry)?;
        let path = self.path_for(identity);
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| Error::Cache(format!("failed to write {}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), "cached snapshot");
        Ok(path)
    }

    /// Read the entry for an identity.
    ///
    /// Returns None if no entry exists.
    pub async fn get(&self, identity: &CacheIdentity) -> Result<Option<CachedSnapshot>, Error> {
        let path = self.path_for(identity);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Cache(format!("failed to read {}: {e}", path.display()))),
        };
        let entry: CachedSnapshot = serde_json::from_str(&raw)?;
        tracing::debug!(path = %path.display(), "cache hit");
        Ok(Some(entry))
    }

    /// Read the entry for an identity, failing with `CacheMiss` if absent.
    pub async fn require(&self, identity: &CacheIdentity) -> Result<CachedSnapshot, Error> {
        self.get(identity).await?.ok_or_else(|| Error::CacheMiss(cache_key(identity)))
    }

    /// Delete the entry for an identity. Returns whether a file was removed.
    pub async fn remove(&self, identity: &CacheIdentity) -> Result<bool, Error> {
        let path = self.path_for(identity);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Cache(format!("failed to remove {}: {e}", path.display()))),
        }
    }

    /// Delete every cached snapshot.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_all(&self) -> Result<u64, Error> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| Error::Cache(format!("failed to list {}: {e}", self.dir.display())))?;

        let mut deleted = 0u64;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Cache(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path)
                    .await
                    .map_err(|e| Error::Cache(format!("failed to remove {}: {e}", path.display())))?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

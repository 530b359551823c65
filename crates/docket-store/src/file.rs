//! Directory-backed storage adapter
//!
//! Each entry is a pretty-printed JSON document named after its key. Keys
//! are escaped so that any identifier maps to a single safe file name:
//! `[A-Za-z0-9_-]` pass through, every other byte becomes `%XX`.

use crate::StoreError;
use async_trait::async_trait;
use docket_domain::{Entry, StorageAdapter};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

/// JSON-file-per-entry adapter
///
/// Writes go to a temporary file first and are renamed into place, so a
/// reader never observes a half-written entry.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Directory holding the entry documents
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(format!("{}.{}", encode_key(key)?, EXTENSION)))
    }
}

/// Escape a key into a file stem
fn encode_key(key: &str) -> Result<String, StoreError> {
    if key.is_empty() {
        return Err(StoreError::InvalidKey("empty key".to_string()));
    }
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            // Writing to a String cannot fail
            let _ = write!(encoded, "%{:02X}", byte);
        }
    }
    Ok(encoded)
}

#[async_trait]
impl StorageAdapter for FileStore {
    type Error = StoreError;

    async fn write(&self, key: &str, entry: &Entry) -> Result<(), Self::Error> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(entry)?;
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Entry>, Self::Error> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(body) => Ok(Some(serde_json::from_slice(&body)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<Entry>, Self::Error> {
        let mut paths = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let body = fs::read(&path).await?;
            entries.push(serde_json::from_slice(&body)?);
        }
        tracing::debug!("Loaded {} entries from {}", entries.len(), self.root.display());
        Ok(entries)
    }

    async fn delete(&self, key: &str) -> Result<bool, Self::Error> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

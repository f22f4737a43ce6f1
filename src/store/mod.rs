//! Directory-backed artifact store.
//!
//! Every generated or downloaded file lives directly inside one directory and
//! is addressed by a bare file name. The same directory is served under
//! [`STATIC_PREFIX`].

pub mod sweeper;

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use bytes::Bytes;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const STATIC_PREFIX: &str = "/static";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: Arc<PathBuf>,
}

impl FileStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<FileStore> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(FileStore {
            root: Arc::new(root),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<prefix>_<32 hex>`, used as a file stem.
    pub fn unique_stem(prefix: &str) -> String {
        format!("{}_{}", prefix, Uuid::new_v4().simple())
    }

    pub fn unique_name(prefix: &str, ext: &str) -> String {
        format!("{}.{}", Self::unique_stem(prefix), ext)
    }

    pub fn url_for(name: &str) -> String {
        format!("{}/{}", STATIC_PREFIX, name)
    }

    /// Joins `name` to the store root after checking it is a bare file name.
    pub fn resolve(&self, name: &str) -> StoreResult<PathBuf> {
        if !is_bare_name(name) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    pub async fn put(&self, name: &str, data: Bytes) -> StoreResult<PathBuf> {
        let path = self.resolve(name)?;
        fs::write(&path, &data).await?;
        debug!(path = ?path, size = data.len(), "artifact stored");
        Ok(path)
    }

    /// Opens an artifact for streaming, returning the handle and its length.
    pub async fn open_file(&self, name: &str) -> StoreResult<(fs::File, u64)> {
        let path = self.resolve(name)?;
        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(StoreError::NotFound(name.to_string()));
        }

        let file = fs::File::open(&path).await?;
        Ok((file, metadata.len()))
    }

    /// Finds the first artifact (by name order) called `<stem>.<anything>`.
    pub async fn find_by_stem(&self, stem: &str) -> StoreResult<Option<String>> {
        let prefix = format!("{stem}.");
        let mut matches = Vec::new();

        let mut dir = fs::read_dir(self.root.as_path()).await?;
        while let Some(entry) = dir.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with(&prefix) && entry.file_type().await?.is_file() {
                matches.push(name);
            }
        }

        matches.sort();
        Ok(matches.into_iter().next())
    }

    /// Deletes every regular file whose modification age at `now` is
    /// strictly greater than `max_age`. Returns the number of files removed.
    pub async fn purge_older_than(&self, max_age: Duration, now: SystemTime) -> StoreResult<usize> {
        let mut deleted = 0;

        let mut dir = fs::read_dir(self.root.as_path()).await?;
        while let Some(entry) = dir.next_entry().await? {
            let metadata = match entry.metadata().await {
                Ok(m) => m,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !metadata.is_file() {
                continue;
            }

            let Ok(modified) = metadata.modified() else {
                continue;
            };
            // mtime in the future
            let Ok(age) = now.duration_since(modified) else {
                continue;
            };
            if age <= max_age {
                continue;
            }

            let path = entry.path();
            match fs::remove_file(&path).await {
                Ok(()) => {
                    info!(path = ?path, age_secs = age.as_secs(), "removed expired artifact");
                    deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => warn!(path = ?path, error = %e, "failed to remove expired artifact"),
            }
        }

        Ok(deleted)
    }
}

fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

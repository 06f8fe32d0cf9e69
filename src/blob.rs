//! Object storage for uploaded profile images.
//!
//! Keys are path-like strings (`user/2023-02-08/<uuid>_avatar.png`). The
//! filesystem store maps them under a root directory and hands back a URL
//! made of the configured public prefix and the key; `main` serves that
//! directory so the URL resolves.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid blob key: {0:?}")]
    InvalidKey(String),
}

pub trait BlobStore: Send + Sync {
    /// Store `data` under `key`, overwriting any previous object, and return
    /// the URL the object can be fetched from.
    fn put(&self, key: &str, data: &[u8], content_type: Option<&str>) -> Result<String, BlobError>;

    /// Remove the object under `key`. Removing a missing object is not an error.
    fn delete(&self, key: &str) -> Result<(), BlobError>;
}

pub type SharedBlobStore = Arc<dyn BlobStore>;

pub struct FileStore {
    root: PathBuf,
    base_url: String,
}

impl FileStore {
    /// The root directory is created if it doesn't exist.
    pub fn open(root: &Path, base_url: &str) -> Result<Self, BlobError> {
        fs::create_dir_all(root).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(FileStore {
            root: root.to_path_buf(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(BlobError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8], _content_type: Option<&str>) -> Result<String, BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(format!("{}/{}", self.base_url, key))
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        Ok(())
    }
}

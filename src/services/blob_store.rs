//! Blob store abstraction consumed by the migration engine.
//!
//! The engine never moves bytes through this process: it asks the store to
//! copy an object from a source URL into a destination handle, and the store
//! performs the copy on its side.

use async_trait::async_trait;
use std::{fmt, io};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("source url `{0}` is not served by this store")]
    UnsupportedUrl(String),
    #[error("invalid object name `{0}`")]
    InvalidObjectName(String),
    #[error("source object `{0}` not found")]
    SourceNotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Address of one object: a container plus an object name within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub container: String,
    pub name: String,
}

impl ObjectHandle {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// Storage backend capable of server-side copy-by-URL.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// URL another copy request can use to read `object`.
    fn url(&self, object: &ObjectHandle) -> String;

    /// Copy the object at `source_url` into `destination`, overwriting it.
    async fn copy_from_url(&self, destination: &ObjectHandle, source_url: &str) -> BlobResult<()>;

    /// Confirm the backend can currently accept copies.
    async fn check_ready(&self) -> BlobResult<()> {
        Ok(())
    }
}

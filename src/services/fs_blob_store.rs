//! src/services/fs_blob_store.rs
//!
//! FsBlobStore — a `BlobStore` on local disk. Containers are directories
//! under `root`, and objects are sharded beneath
//! `root/{container}/{shard}/{shard}/{name}` so no single directory grows
//! unbounded. Object URLs are `file://` URLs; copies go through a temp file
//! and an atomic rename so a reader never observes a partial object.

use super::blob_store::{BlobError, BlobResult, BlobStore, ObjectHandle};
use async_trait::async_trait;
use std::{
    io::{self, ErrorKind},
    path::{Component, Path, PathBuf},
};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

const FILE_SCHEME: &str = "file://";
const MAX_OBJECT_NAME_LEN: usize = 1024;
const READY_MARKER: &[u8] = b"attachment-migrator";

#[derive(Clone, Debug)]
pub struct FsBlobStore {
    /// Base directory on disk where containers are created.
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Reject names that could escape their container directory.
    fn ensure_name_safe(name: &str) -> BlobResult<()> {
        let unsafe_name = name.is_empty()
            || name.len() > MAX_OBJECT_NAME_LEN
            || name.starts_with('/')
            || name.contains("..")
            || name
                .bytes()
                .any(|b| b.is_ascii_control() || b == b'\\' || b == b'\0');
        if unsafe_name {
            return Err(BlobError::InvalidObjectName(name.to_string()));
        }
        Ok(())
    }

    /// Two-level shard directories derived from MD5(container/name).
    fn object_shards(container: &str, name: &str) -> (String, String) {
        let digest = md5::compute(format!("{}/{}", container, name));
        (format!("{:02x}", digest[0]), format!("{:02x}", digest[1]))
    }

    /// Physical path of an object. Parent directories may not exist yet.
    pub(crate) fn object_path(&self, object: &ObjectHandle) -> PathBuf {
        let (shard_a, shard_b) = Self::object_shards(&object.container, &object.name);
        let mut path = self.root.clone();
        path.push(&object.container);
        path.push(shard_a);
        path.push(shard_b);
        path.push(&object.name);
        path
    }

    /// Map a `file://` URL back to a path, refusing anything outside `root`.
    fn source_path(&self, source_url: &str) -> BlobResult<PathBuf> {
        let raw = source_url
            .strip_prefix(FILE_SCHEME)
            .ok_or_else(|| BlobError::UnsupportedUrl(source_url.to_string()))?;
        let path = PathBuf::from(raw);
        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes || !path.starts_with(&self.root) {
            return Err(BlobError::UnsupportedUrl(source_url.to_string()));
        }
        Ok(path)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    fn url(&self, object: &ObjectHandle) -> String {
        format!("{}{}", FILE_SCHEME, self.object_path(object).display())
    }

    async fn copy_from_url(&self, destination: &ObjectHandle, source_url: &str) -> BlobResult<()> {
        Self::ensure_name_safe(&destination.name)?;
        Self::ensure_name_safe(&destination.container)?;
        let source = self.source_path(source_url)?;
        let target = self.object_path(destination);

        let parent = target.parent().map(Path::to_path_buf).ok_or_else(|| {
            BlobError::Io(io::Error::new(
                ErrorKind::Other,
                "object path missing parent directory",
            ))
        })?;
        fs::create_dir_all(&parent).await?;
        let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

        if let Err(err) = fs::copy(&source, &tmp_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(match err.kind() {
                ErrorKind::NotFound => BlobError::SourceNotFound(source_url.to_string()),
                _ => BlobError::Io(err),
            });
        }

        if let Err(err) = fs::rename(&tmp_path, &target).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(BlobError::Io(err));
        }

        debug!("copied {} -> {}", source.display(), target.display());
        Ok(())
    }

    /// Write, read back and remove a marker file directly under `root`.
    async fn check_ready(&self) -> BlobResult<()> {
        let marker = self.root.join(format!(".ready-{}", Uuid::new_v4()));
        fs::write(&marker, READY_MARKER).await?;
        let read_back = fs::read(&marker).await;
        let _ = fs::remove_file(&marker).await;
        if read_back? != READY_MARKER {
            return Err(BlobError::Io(io::Error::other("blob root returned different bytes")));
        }
        Ok(())
    }
}

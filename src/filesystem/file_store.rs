use async_trait::async_trait;
use bytes::Bytes;
use futures::{
    stream::{self, BoxStream},
    StreamExt, TryStreamExt,
};
use serde::{Deserialize, Serialize};
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tokio_util::io::ReaderStream;

use super::{
    file_id::{IdGenerator, UuidGenerator},
    metadata::UploadMetadata,
};
use crate::config::StorageConfig;

/// Directory under the storage root holding uploads that are still being written.
pub const STAGING_DIR: &str = ".staging";

/// A lazy, finite stream of file content.
pub type ByteStream<'a> = BoxStream<'a, io::Result<Bytes>>;

/// A lazy stream of the files found in a user namespace.
pub type RecordStream = BoxStream<'static, Result<FileRecord, FileStoreError>>;

/// The externally visible representation of a stored file: its generated id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(rename = "fileName")]
    file_name: String,
}

impl FileRecord {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("invalid name {0:?}")]
    InvalidName(String),

    #[error("file {0} not found")]
    NotFound(String),

    #[error("could not store file: {0}")]
    CreationError(#[source] io::Error),

    #[error("could not read file: {0}")]
    ReadError(#[source] io::Error),

    #[error("could not remove file: {0}")]
    TerminationError(#[source] io::Error),
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Write `data` to a fresh staging file under a newly generated id.
    async fn stage(
        &self,
        metadata: UploadMetadata,
        data: ByteStream<'_>,
    ) -> Result<StagedUpload, FileStoreError>;

    /// Move a staged upload into `user_id`'s namespace, making it visible.
    async fn commit(
        &self,
        staged: StagedUpload,
        user_id: &str,
    ) -> Result<FileRecord, FileStoreError>;

    async fn store(
        &self,
        user_id: &str,
        metadata: UploadMetadata,
        data: ByteStream<'_>,
    ) -> Result<FileRecord, FileStoreError> {
        validate_name(user_id)?;
        let staged = self.stage(metadata, data).await?;
        self.commit(staged, user_id).await
    }

    /// List the files of `user_id`. An unknown user has no files.
    async fn list(&self, user_id: &str) -> Result<RecordStream, FileStoreError>;

    async fn read(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<ByteStream<'static>, FileStoreError>;

    async fn delete(&self, user_id: &str, file_id: &str) -> Result<DeleteOutcome, FileStoreError>;
}

/// Check that `name` can be used as a single path segment below the storage root.
///
/// Names starting with a dot are refused, which covers `.` and `..` and keeps
/// user ids from colliding with [`STAGING_DIR`].
pub fn validate_name(name: &str) -> Result<&str, FileStoreError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0'));

    if invalid {
        return Err(FileStoreError::InvalidName(name.to_string()));
    }

    Ok(name)
}

/// An upload whose bytes are fully on disk but not yet in any user namespace.
///
/// Dropping it without committing removes the staging file, so an upload that
/// fails or is abandoned half way never becomes visible.
#[derive(Debug)]
pub struct StagedUpload {
    id: String,
    path: PathBuf,
    armed: bool,
}

impl StagedUpload {
    pub(crate) fn new(id: String, path: PathBuf) -> Self {
        Self {
            id,
            path,
            armed: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stop tracking the staging file and hand back the id.
    fn release(mut self) -> String {
        self.armed = false;
        std::mem::take(&mut self.id)
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Discarded staged upload {}", self.id),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Could not discard staged upload {}: {}", self.id, e),
        }
    }
}

/// A [`FileStore`] keeping every user's files in `<root>/<user_id>/<file_id>`.
pub struct LocalFileStore {
    root_path: PathBuf,
    read_chunk_size: usize,
    ids: Arc<dyn IdGenerator>,
}

impl LocalFileStore {
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            root_path: config.root.clone(),
            read_chunk_size: config.read_chunk_size.max(1),
            ids: Arc::new(UuidGenerator),
        }
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn staging_path(&self) -> PathBuf {
        self.root_path.join(STAGING_DIR)
    }

    fn user_path(&self, user_id: &str) -> Result<PathBuf, FileStoreError> {
        Ok(self.root_path.join(validate_name(user_id)?))
    }

    fn file_path(&self, user_id: &str, file_id: &str) -> Result<PathBuf, FileStoreError> {
        Ok(self.user_path(user_id)?.join(validate_name(file_id)?))
    }
}

/// Drain `data` into `file`. The handle is closed before this returns.
async fn write_stream(mut file: File, mut data: ByteStream<'_>) -> io::Result<u64> {
    let mut written = 0;

    while let Some(chunk) = data.try_next().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    Ok(written)
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn stage(
        &self,
        metadata: UploadMetadata,
        data: ByteStream<'_>,
    ) -> Result<StagedUpload, FileStoreError> {
        let staging_dir = self.staging_path();
        fs::create_dir_all(&staging_dir)
            .await
            .map_err(FileStoreError::CreationError)?;

        let id = self.ids.generate();
        let path = staging_dir.join(validate_name(&id)?);
        tracing::debug!(
            file_id = %id,
            content_type = ?metadata.content_type(),
            client_file_name = ?metadata.file_name(),
            "Staging upload"
        );

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(FileStoreError::CreationError)?;

        let staged = StagedUpload::new(id, path);
        let written = write_stream(file, data)
            .await
            .map_err(FileStoreError::CreationError)?;

        tracing::debug!(file_id = %staged.id(), bytes = written, "Upload staged");
        Ok(staged)
    }

    async fn commit(
        &self,
        staged: StagedUpload,
        user_id: &str,
    ) -> Result<FileRecord, FileStoreError> {
        let user_dir = self.user_path(user_id)?;
        fs::create_dir_all(&user_dir)
            .await
            .map_err(FileStoreError::CreationError)?;

        let target = user_dir.join(staged.id());
        fs::rename(staged.path(), &target)
            .await
            .map_err(FileStoreError::CreationError)?;

        Ok(FileRecord::new(staged.release()))
    }

    async fn list(&self, user_id: &str) -> Result<RecordStream, FileStoreError> {
        let user_dir = self.user_path(user_id)?;

        let entries = match fs::read_dir(&user_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(stream::empty().boxed()),
            Err(e) => return Err(FileStoreError::ReadError(e)),
        };

        let records = stream::try_unfold(entries, |mut entries| async move {
            let next = entries.next_entry().await?;
            Ok::<_, io::Error>(next.map(|entry| {
                let record = FileRecord::new(entry.file_name().to_string_lossy());
                (record, entries)
            }))
        })
        .map_err(FileStoreError::ReadError);

        Ok(records.boxed())
    }

    async fn read(
        &self,
        user_id: &str,
        file_id: &str,
    ) -> Result<ByteStream<'static>, FileStoreError> {
        let path = self.file_path(user_id, file_id)?;

        let file = match File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FileStoreError::NotFound(file_id.to_string()))
            }
            Err(e) => return Err(FileStoreError::ReadError(e)),
        };

        let metadata = file.metadata().await.map_err(FileStoreError::ReadError)?;
        if !metadata.is_file() {
            return Err(FileStoreError::NotFound(file_id.to_string()));
        }

        Ok(ReaderStream::with_capacity(file, self.read_chunk_size).boxed())
    }

    async fn delete(&self, user_id: &str, file_id: &str) -> Result<DeleteOutcome, FileStoreError> {
        let path = self.file_path(user_id, file_id)?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(DeleteOutcome::Deleted),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(DeleteOutcome::NotFound),
            Err(e) => Err(FileStoreError::TerminationError(e)),
        }
    }
}

//! The filesystem operations the file handlers are written against.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mime::Mime;
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWrite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Filesystem failures. Absence is reported on its own so callers can
/// branch on it; everything else is opaque.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl FsError {
    /// Classifies an error raised while operating on `path`.
    pub fn from_io(error: io::Error, path: &Path) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io(error),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[async_trait]
pub trait FileSystem: Send + Sync + 'static {
    type Reader: AsyncRead + Send + Unpin + 'static;
    type Writer: AsyncWrite + Send + Unpin + 'static;

    async fn metadata(&self, path: &Path) -> Result<EntryKind, FsError>;

    /// Names of the entries in a directory, in the order the OS returns them.
    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FsError>;

    async fn open_read(&self, path: &Path) -> Result<Self::Reader, FsError>;

    /// Creates the file or truncates an existing one.
    async fn open_write(&self, path: &Path) -> Result<Self::Writer, FsError>;

    async fn remove_file(&self, path: &Path) -> Result<(), FsError>;

    /// Fails unless the directory is empty.
    async fn remove_dir(&self, path: &Path) -> Result<(), FsError>;
}

/// [`FileSystem`] over the local disk through `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

#[async_trait]
impl FileSystem for LocalFileSystem {
    type Reader = fs::File;
    type Writer = fs::File;

    async fn metadata(&self, path: &Path) -> Result<EntryKind, FsError> {
        let metadata = fs::metadata(path).await.map_err(|e| FsError::from_io(e, path))?;
        Ok(if metadata.is_dir() { EntryKind::Directory } else { EntryKind::File })
    }

    async fn read_dir(&self, path: &Path) -> Result<Vec<String>, FsError> {
        let mut entries = fs::read_dir(path).await.map_err(|e| FsError::from_io(e, path))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    async fn open_read(&self, path: &Path) -> Result<Self::Reader, FsError> {
        fs::File::open(path).await.map_err(|e| FsError::from_io(e, path))
    }

    async fn open_write(&self, path: &Path) -> Result<Self::Writer, FsError> {
        fs::File::create(path).await.map_err(|e| FsError::from_io(e, path))
    }

    async fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path).await.map_err(|e| FsError::from_io(e, path))
    }

    async fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_dir(path).await.map_err(|e| FsError::from_io(e, path))
    }
}

/// Guesses a file's media type from its extension.
pub fn content_type(path: &Path) -> Mime {
    mime_guess::from_path(path).first_or_octet_stream()
}

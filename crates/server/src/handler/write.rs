use std::sync::Arc;

use async_trait::async_trait;
use http_body_util::BodyExt;
use micro_fs_http::protocol::body::ReqBody;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::fs::{FileSystem, FsError};
use crate::handler::Operation;
use crate::reply::{Reply, ServeError};
use crate::resolver::RequestPath;

/// `PUT`: replaces the file with the request body, chunk by chunk.
///
/// A body that fails halfway leaves whatever was written so far on disk.
#[derive(Debug)]
pub struct WriteFile<F> {
    fs: Arc<F>,
}

impl<F> WriteFile<F> {
    pub fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl<F: FileSystem> Operation for WriteFile<F> {
    async fn execute(&self, path: RequestPath, mut body: ReqBody) -> Result<Reply, ServeError> {
        let mut file = self.fs.open_write(&path).await?;

        let mut written: u64 = 0;
        while let Some(frame) = body.frame().await {
            if let Ok(data) = frame?.into_data() {
                file.write_all(&data).await.map_err(FsError::from)?;
                written += data.len() as u64;
            }
        }
        file.flush().await.map_err(FsError::from)?;

        debug!(path = %path.display(), size = written, "file written");
        Ok(Reply::no_content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::handler::test_support::request_path;
    use http::StatusCode;

    fn write_file() -> WriteFile<LocalFileSystem> {
        WriteFile::new(Arc::new(LocalFileSystem))
    }

    #[tokio::test]
    async fn creates_file() {
        let root = tempfile::tempdir().unwrap();

        let reply = write_file().execute(request_path(root.path(), "/new.txt"), ReqBody::full("fresh")).await.unwrap();

        assert_eq!(reply.status(), StatusCode::NO_CONTENT);
        assert!(reply.body().as_bytes().is_none());
        assert_eq!(std::fs::read_to_string(root.path().join("new.txt")).unwrap(), "fresh");
    }

    #[tokio::test]
    async fn truncates_existing_file() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("old.txt"), "a much longer previous content").unwrap();

        write_file().execute(request_path(root.path(), "/old.txt"), ReqBody::full("short")).await.unwrap();

        assert_eq!(std::fs::read_to_string(root.path().join("old.txt")).unwrap(), "short");
    }

    #[tokio::test]
    async fn empty_body_makes_empty_file() {
        let root = tempfile::tempdir().unwrap();

        write_file().execute(request_path(root.path(), "/empty"), ReqBody::empty()).await.unwrap();

        assert_eq!(std::fs::read(root.path().join("empty")).unwrap(), b"");
    }

    #[tokio::test]
    async fn missing_parent_fails() {
        let root = tempfile::tempdir().unwrap();

        let error = write_file().execute(request_path(root.path(), "/no/such/dir.txt"), ReqBody::full("x")).await.unwrap_err();

        assert!(matches!(error, ServeError::Fs(FsError::NotFound(_))));
    }
}

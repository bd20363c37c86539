use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use micro_fs_http::protocol::body::ReqBody;
use tracing::debug;

use crate::body::ResponseBody;
use crate::fs::{EntryKind, FileSystem, FsError, content_type};
use crate::handler::Operation;
use crate::reply::{FailureSignal, Reply, ServeError};
use crate::resolver::RequestPath;

/// `GET`: a file's content, or the names in a directory one per line.
#[derive(Debug)]
pub struct ReadFile<F> {
    fs: Arc<F>,
}

impl<F> ReadFile<F> {
    pub fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl<F: FileSystem> Operation for ReadFile<F> {
    async fn execute(&self, path: RequestPath, _body: ReqBody) -> Result<Reply, ServeError> {
        let kind = match self.fs.metadata(&path).await {
            Ok(kind) => kind,
            Err(FsError::NotFound(_)) => return Err(FailureSignal::not_found().into()),
            Err(e) => return Err(e.into()),
        };

        match kind {
            EntryKind::Directory => {
                let names = self.fs.read_dir(&path).await?;
                debug!(path = %path.display(), entries = names.len(), "listing directory");
                Ok(Reply::text(StatusCode::OK, names.join("\n")))
            }
            EntryKind::File => {
                let reader = self.fs.open_read(&path).await?;
                Ok(Reply::new(StatusCode::OK).with_body(ResponseBody::reader(reader)).with_content_type(content_type(&path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::handler::test_support::{body_text, request_path};

    fn read_file() -> ReadFile<LocalFileSystem> {
        ReadFile::new(Arc::new(LocalFileSystem))
    }

    #[tokio::test]
    async fn streams_file_with_guessed_type() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("foo.txt"), "hi").unwrap();

        let reply = read_file().execute(request_path(root.path(), "/foo.txt"), ReqBody::empty()).await.unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.content_type(), &mime::TEXT_PLAIN);
        assert!(reply.body().is_stream());
        assert_eq!(body_text(reply).await, "hi");
    }

    #[tokio::test]
    async fn lists_directory() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join("a"), "").unwrap();
        std::fs::create_dir(root.path().join("b")).unwrap();

        let reply = read_file().execute(request_path(root.path(), "/"), ReqBody::empty()).await.unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(reply.content_type(), &mime::TEXT_PLAIN);
        let listing = body_text(reply).await;
        let mut names: Vec<&str> = listing.split('\n').collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b"]);
    }

    #[tokio::test]
    async fn empty_directory_lists_nothing() {
        let root = tempfile::tempdir().unwrap();
        let reply = read_file().execute(request_path(root.path(), "/"), ReqBody::empty()).await.unwrap();
        assert_eq!(body_text(reply).await, "");
    }

    #[tokio::test]
    async fn missing_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let error = read_file().execute(request_path(root.path(), "/nope.txt"), ReqBody::empty()).await.unwrap_err();
        assert!(matches!(error, ServeError::Signal(signal) if signal == FailureSignal::not_found()));
    }
}

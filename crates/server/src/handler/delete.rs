use std::sync::Arc;

use async_trait::async_trait;
use micro_fs_http::protocol::body::ReqBody;
use tracing::debug;

use crate::fs::{EntryKind, FileSystem, FsError};
use crate::handler::Operation;
use crate::reply::{Reply, ServeError};
use crate::resolver::RequestPath;

/// `DELETE`: removes a file or an empty directory. Deleting something that
/// does not exist succeeds.
#[derive(Debug)]
pub struct DeleteFile<F> {
    fs: Arc<F>,
}

impl<F> DeleteFile<F> {
    pub fn new(fs: Arc<F>) -> Self {
        Self { fs }
    }
}

#[async_trait]
impl<F: FileSystem> Operation for DeleteFile<F> {
    async fn execute(&self, path: RequestPath, _body: ReqBody) -> Result<Reply, ServeError> {
        match self.fs.metadata(&path).await {
            Ok(EntryKind::Directory) => self.fs.remove_dir(&path).await?,
            Ok(EntryKind::File) => self.fs.remove_file(&path).await?,
            Err(FsError::NotFound(_)) => debug!(path = %path.display(), "nothing to delete"),
            Err(e) => return Err(e.into()),
        }
        Ok(Reply::no_content())
    }
}

//! One [`Operation`] per supported method.
//!
//! Operations receive a path that already passed containment and branch only
//! on the failures they anticipate; anything else is returned as a
//! [`ServeError`] for the dispatcher to turn into a `500`.

mod delete;
mod read;
mod write;

pub use delete::DeleteFile;
pub use read::ReadFile;
pub use write::WriteFile;

use async_trait::async_trait;
use micro_fs_http::protocol::body::ReqBody;

use crate::reply::{Reply, ServeError};
use crate::resolver::RequestPath;

#[async_trait]
pub trait Operation: Send + Sync {
    async fn execute(&self, path: RequestPath, body: ReqBody) -> Result<Reply, ServeError>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use http::Uri;
    use http_body_util::BodyExt;

    use crate::reply::Reply;
    use crate::resolver::{PathResolver, RequestPath};

    pub(crate) fn request_path(root: &std::path::Path, uri: &str) -> RequestPath {
        PathResolver::new(root).resolve(&uri.parse::<Uri>().unwrap()).unwrap()
    }

    pub(crate) async fn body_text(reply: Reply) -> String {
        let bytes = reply.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

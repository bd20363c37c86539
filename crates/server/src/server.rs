use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;

use micro_fs_http::connection::HttpConnection;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::dispatcher::Dispatcher;
use crate::fs::LocalFileSystem;
use crate::resolver::PathResolver;
use crate::routes::Routes;

#[derive(Debug, Default)]
pub struct ServerBuilder {
    root: Option<PathBuf>,
    address: Option<io::Result<Vec<SocketAddr>>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// The directory to serve. Must be absolute.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn bind<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let root = self.root.ok_or(ServerBuildError::MissingRoot)?;
        if !root.is_absolute() {
            return Err(ServerBuildError::RelativeRoot(root));
        }

        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::InvalidAddress)?;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }

        let dispatcher = Dispatcher::new(PathResolver::new(root.clone()), Routes::file_access(LocalFileSystem));
        Ok(Server { root, address, dispatcher: Arc::new(dispatcher) })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("root directory must be set")]
    MissingRoot,
    #[error("root directory must be absolute: {}", .0.display())]
    RelativeRoot(PathBuf),
    #[error("address must be set")]
    MissingAddress,
    #[error("invalid address: {0}")]
    InvalidAddress(#[source] io::Error),
}

/// Serves the root directory over HTTP/1.1, one task per connection.
#[derive(Debug)]
pub struct Server {
    root: PathBuf,
    address: Vec<SocketAddr>,
    dispatcher: Arc<Dispatcher>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the configured address and serves until the process ends.
    pub async fn start(self) -> io::Result<()> {
        let listener = TcpListener::bind(self.address.as_slice()).await.inspect_err(|e| {
            error!(address = ?self.address, cause = %e, "bind server error");
        })?;
        self.serve(listener).await
    }

    /// Accepts connections from an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> io::Result<()> {
        info!(address = ?listener.local_addr()?, root = %self.root.display(), "start listening");

        loop {
            let (tcp_stream, remote_addr) = match listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let dispatcher = Arc::clone(&self.dispatcher);
            tokio::spawn(async move {
                let (reader, writer) = tcp_stream.into_split();
                let connection = HttpConnection::new(reader, writer);
                match connection.process(dispatcher).await {
                    Ok(()) => debug!(%remote_addr, "connection finished"),
                    Err(e) => warn!(%remote_addr, cause = %e, "connection closed with error"),
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    #[test]
    fn root_is_required_and_absolute() {
        assert!(matches!(Server::builder().bind("127.0.0.1:0").build(), Err(ServerBuildError::MissingRoot)));
        assert!(matches!(
            Server::builder().root("relative/dir").bind("127.0.0.1:0").build(),
            Err(ServerBuildError::RelativeRoot(_))
        ));
    }

    #[test]
    fn address_is_required() {
        let root = tempfile::tempdir().unwrap();
        assert!(matches!(Server::builder().root(root.path()).build(), Err(ServerBuildError::MissingAddress)));
        assert!(matches!(
            Server::builder().root(root.path()).bind("not an address").build(),
            Err(ServerBuildError::InvalidAddress(_))
        ));
    }

    #[tokio::test]
    async fn serves_over_tcp() {
        let root = tempfile::tempdir().unwrap();
        let server = Server::builder().root(root.path()).bind("127.0.0.1:0").build().unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener));

        let mut stream = TcpStream::connect(address).await.unwrap();
        stream
            .write_all(b"PUT /hello.txt HTTP/1.1\r\nContent-Length: 2\r\n\r\nhiGET /hello.txt HTTP/1.1\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();

        let mut output = String::new();
        stream.read_to_string(&mut output).await.unwrap();

        let (put, get) = output.split_once("HTTP/1.1 200 OK\r\n").unwrap();
        assert!(put.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(!put.contains("content-length"));
        assert!(get.contains("content-type: text/plain\r\n"));
        assert!(get.contains("transfer-encoding: chunked\r\n"));
        assert!(get.ends_with("\r\n\r\n2\r\nhi\r\n0\r\n\r\n"));
        assert_eq!(std::fs::read_to_string(root.path().join("hello.txt")).unwrap(), "hi");
    }

    #[tokio::test]
    async fn chunked_binary_upload_over_tcp() {
        let root = tempfile::tempdir().unwrap();
        let server = Server::builder().root(root.path()).bind("127.0.0.1:0").build().unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(server.serve(listener));

        let content: Vec<u8> = (0..=255u8).rev().cycle().take(70_000).collect();
        let mut request = b"PUT /blob.bin HTTP/1.1\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n".to_vec();
        for chunk in content.chunks(20_000) {
            request.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
            request.extend_from_slice(chunk);
            request.extend_from_slice(b"\r\n");
        }
        request.extend_from_slice(b"0\r\n\r\n");

        let mut stream = TcpStream::connect(address).await.unwrap();
        stream.write_all(&request).await.unwrap();

        let mut output = Vec::new();
        stream.read_to_end(&mut output).await.unwrap();

        assert!(output.starts_with(b"HTTP/1.1 204 No Content\r\n"));
        assert_eq!(std::fs::read(root.path().join("blob.bin")).unwrap(), content);
    }
}

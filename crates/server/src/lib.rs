//! A minimal HTTP file access service.
//!
//! One directory is exposed over HTTP/1.1:
//!
//! | method | effect | success |
//! |---|---|---|
//! | `GET` | file content, or the entry names of a directory one per line | `200` |
//! | `PUT` | create or replace a file with the request body | `204` |
//! | `DELETE` | remove a file or an empty directory | `204` |
//!
//! Any other method is answered with `405`. Request paths are percent-decoded
//! and resolved lexically against the root; a path that ends up outside of it
//! is refused with `403` before the filesystem is touched.
//!
//! ```no_run
//! use micro_fs::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     Server::builder().root("/srv/files").bind("127.0.0.1:8000").build()?.start().await?;
//!     Ok(())
//! }
//! ```
//!
//! The pieces can also be assembled by hand: [`PathResolver`] confines paths,
//! [`Routes`] maps methods to [`handler::Operation`]s, and [`Dispatcher`]
//! ties both together as a [`micro_fs_http::handler::Handler`].

pub mod body;
pub mod dispatcher;
pub mod fs;
pub mod handler;
pub mod reply;
pub mod resolver;
pub mod routes;
pub mod server;

pub use body::ResponseBody;
pub use dispatcher::Dispatcher;
pub use reply::{FailureSignal, Reply, ServeError};
pub use resolver::{PathResolver, RequestPath};
pub use routes::Routes;
pub use server::{Server, ServerBuildError, ServerBuilder};

//! Routes each request to its operation and turns every outcome, good or
//! bad, into exactly one response.

use std::convert::Infallible;

use async_trait::async_trait;
use http::{Request, Response};
use micro_fs_http::handler::Handler;
use micro_fs_http::protocol::body::ReqBody;
use tracing::{info, warn};

use crate::body::ResponseBody;
use crate::reply::{FailureSignal, Reply, ServeError};
use crate::resolver::PathResolver;
use crate::routes::Routes;

#[derive(Debug)]
pub struct Dispatcher {
    resolver: PathResolver,
    routes: Routes,
}

impl Dispatcher {
    pub fn new(resolver: PathResolver, routes: Routes) -> Self {
        Self { resolver, routes }
    }

    /// Routes, resolves and executes one request.
    ///
    /// Unsupported methods are refused before the path is looked at.
    pub async fn dispatch(&self, request: Request<ReqBody>) -> Reply {
        let (parts, body) = request.into_parts();

        let Some(operation) = self.routes.get(&parts.method) else {
            return FailureSignal::method_not_allowed(&parts.method).into();
        };

        let result = match self.resolver.resolve(&parts.uri) {
            Ok(path) => operation.execute(path, body).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(reply) => reply,
            Err(e @ ServeError::Signal(_)) => e.into(),
            Err(e) => {
                warn!(method = %parts.method, path = parts.uri.path(), cause = %e, "request failed");
                e.into()
            }
        }
    }
}

#[async_trait]
impl Handler for Dispatcher {
    type RespBody = ResponseBody;
    type Error = Infallible;

    async fn call(&self, request: Request<ReqBody>) -> Result<Response<Self::RespBody>, Self::Error> {
        let method = request.method().clone();
        let path = request.uri().path().to_owned();

        let reply = self.dispatch(request).await;

        info!(%method, %path, status = reply.status().as_u16(), "served request");
        Ok(reply.into())
    }
}

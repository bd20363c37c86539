//! What an operation hands back: a [`Reply`] on success, a [`ServeError`]
//! otherwise.

use std::borrow::Cow;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderValue, Method, Response, StatusCode};
use mime::Mime;
use micro_fs_http::protocol::ParseError;
use thiserror::Error;
use tracing::error;

use crate::body::ResponseBody;
use crate::fs::FsError;

/// Status, body and content type of one response.
#[derive(Debug)]
pub struct Reply {
    status: StatusCode,
    body: ResponseBody,
    content_type: Mime,
}

impl Reply {
    /// An empty `text/plain` reply.
    pub fn new(status: StatusCode) -> Self {
        Self { status, body: ResponseBody::empty(), content_type: mime::TEXT_PLAIN }
    }

    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    pub fn text(status: StatusCode, text: impl Into<Bytes>) -> Self {
        Self::new(status).with_body(ResponseBody::once(text.into()))
    }

    #[must_use]
    pub fn with_body(mut self, body: ResponseBody) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: Mime) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    pub fn into_body(self) -> ResponseBody {
        self.body
    }
}

impl From<Reply> for Response<ResponseBody> {
    fn from(reply: Reply) -> Self {
        let mut response = Response::new(reply.body);
        *response.status_mut() = reply.status;
        match HeaderValue::from_str(reply.content_type.as_ref()) {
            Ok(value) => {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
            Err(e) => {
                error!(content_type = %reply.content_type, cause = %e, "content type is not a valid header value");
                response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
            }
        }
        response
    }
}

/// An anticipated failure that maps to a fixed status and message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {body}")]
pub struct FailureSignal {
    status: StatusCode,
    body: Cow<'static, str>,
}

impl FailureSignal {
    pub fn new(status: StatusCode, body: impl Into<Cow<'static, str>>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "Forbidden")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "File not found")
    }

    pub fn method_not_allowed(method: &Method) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, format!("Method {method} not allowed."))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl From<FailureSignal> for Reply {
    fn from(signal: FailureSignal) -> Self {
        let body = match signal.body {
            Cow::Borrowed(text) => Bytes::from_static(text.as_bytes()),
            Cow::Owned(text) => Bytes::from(text),
        };
        Reply::text(signal.status, body)
    }
}

/// Everything an operation can fail with.
///
/// Only [`ServeError::Signal`] carries its own status; the other variants
/// are unexpected and answered with `500` and the error text.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Signal(#[from] FailureSignal),

    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("failed to read request body: {0}")]
    Body(#[from] ParseError),

    #[error("URI malformed: {0}")]
    MalformedPath(String),
}

impl From<ServeError> for Reply {
    fn from(error: ServeError) -> Self {
        match error {
            ServeError::Signal(signal) => signal.into(),
            error => Reply::text(StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        }
    }
}

//! Response head handed to the encoder.

use http::{Response, StatusCode};

/// The head of an HTTP response; the body travels separately as payload items.
pub type ResponseHead = Response<()>;

/// Whether a response with this status may carry a payload.
///
/// 1xx, 204 and 304 responses never have one, so they must not announce a
/// `Content-Length` either.
pub fn status_allows_body(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

//! Protocol types shared by the codec and the connection.
//!
//! - [`Message`], [`PayloadItem`], [`PayloadSize`]: frames moving through the codec
//! - [`RequestHeader`]: the decoded request head
//! - [`ResponseHead`]: the response head handed to the encoder
//! - [`HttpError`], [`ParseError`], [`SendError`]: failures on either side
//! - [`body`]: the streaming request body given to handlers

mod message;
pub use message::Message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod request;
pub use request::RequestHeader;

mod response;
pub use response::ResponseHead;
pub use response::status_allows_body;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;

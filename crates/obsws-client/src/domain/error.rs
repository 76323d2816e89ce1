//! Error types returned by the client.
//!
//! Every failure a caller can see is one [`ClientError`] variant.  Only
//! [`ClientError::Disconnected`] is shared across calls: a transport loss
//! fails all in-flight work at once.  Every other variant is scoped to the
//! single request or batch that produced it.

use obsws_core::{CloseCode, CodecError, RequestStatus, ResponseParseError};
use thiserror::Error;

/// Failures of the underlying socket.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The initial connection attempt failed.
    #[error("failed to connect to {url}: {reason}")]
    ConnectFailed { url: String, reason: String },

    /// No socket is currently open.
    #[error("transport is not connected")]
    NotConnected,

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// `start` was called on a transport that is already running.
    #[error("transport already started")]
    AlreadyStarted,
}

/// Errors returned by [`ObsClient`](crate::ObsClient) operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The connection dropped while the call was in flight, or before it began.
    #[error("connection lost")]
    Disconnected,

    /// The session has not completed the Identify handshake yet.
    #[error("session is not identified")]
    NotIdentified,

    /// The server closed the socket during the handshake.
    #[error("handshake failed: {code}{}", fmt_comment(.comment))]
    HandshakeFailed {
        code: CloseCode,
        comment: Option<String>,
    },

    /// No response arrived within the deadline.  The id is free for reuse.
    #[error("request {request_id} timed out")]
    RequestTimedOut { request_id: String },

    /// The server processed the request and rejected it.
    #[error("request failed: {code}{}", fmt_comment(.comment))]
    RequestFailed {
        code: RequestStatus,
        comment: Option<String>,
    },

    /// A well-formed frame lacked a field this call needs.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A request id is already registered for another in-flight call.
    #[error("request id {0} is already in flight")]
    DuplicateRequestId(String),

    /// An outbound frame could not be encoded.
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ResponseParseError> for ClientError {
    fn from(err: ResponseParseError) -> Self {
        ClientError::MalformedPayload(err.to_string())
    }
}

fn fmt_comment(comment: &Option<String>) -> String {
    comment
        .as_deref()
        .map(|c| format!(": {c}"))
        .unwrap_or_default()
}

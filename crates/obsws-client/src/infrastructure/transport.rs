//! The socket seam.
//!
//! [`ObsClient`](crate::ObsClient) never touches a socket directly.  It talks
//! to a [`Transport`], which delivers everything it observes as
//! [`TransportEvent`]s on one channel, in the order it observed them.  The
//! production implementation is [`WsTransport`](super::ws_transport::WsTransport);
//! tests use [`MockTransport`](super::mock::MockTransport).

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::TransportError;

/// What a transport reports to the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A socket is open.  Sent once per (re)connection, before any message.
    Connected,
    /// One text frame.
    Message(String),
    /// The socket closed.  `code` and `reason` come from the close frame,
    /// if there was one.
    Disconnected {
        code: Option<u16>,
        reason: Option<String>,
    },
}

/// A text-frame socket with its own reconnect policy.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Opens the socket and starts delivering events on `events`.
    ///
    /// Returns once the first connection attempt has succeeded or failed.
    /// Later drops and reconnects are reported as events only.
    async fn start(&self, events: mpsc::UnboundedSender<TransportEvent>) -> Result<(), TransportError>;

    /// Writes one text frame.
    async fn send(&self, text: String) -> Result<(), TransportError>;

    /// Closes the socket and stops reconnecting.
    async fn close(&self, code: u16, reason: &str) -> Result<(), TransportError>;
}

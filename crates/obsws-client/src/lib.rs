//! obsws-client library entry point.
//!
//! # What does obsws-client do? (for beginners)
//!
//! OBS Studio's WebSocket server speaks a small protocol on top of JSON text
//! frames.  A session goes like this:
//!
//! 1. The client opens the socket and the server sends **Hello**, possibly
//!    with an authentication challenge.
//! 2. The client answers with **Identify**, carrying the authentication hash
//!    and the event categories it wants.
//! 3. The server confirms with **Identified**.  From now on the client may
//!    send **Request** and **RequestBatch** frames, each tagged with a
//!    `requestId`, and the server answers each one with a response frame
//!    carrying the same id.
//! 4. In between, the server pushes **Event** frames whenever something
//!    changes in OBS.
//!
//! [`ObsClient`] runs that protocol: it matches responses to the callers
//! waiting for them, enforces per-call deadlines, routes events to
//! subscribers, and fails all in-flight work when the socket drops.
//!
//! ```ignore
//! use obsws_client::{ClientConfig, ObsClient};
//! use obsws_core::request::stream;
//!
//! let client = ObsClient::with_websocket(ClientConfig::default().with_password("secret"));
//! client.connect_and_identify().await?;
//! let status = client.send_request(stream::get_stream_status()).await?;
//! println!("live: {}", status.active);
//! ```

/// Domain layer: configuration, errors, states, event values.
pub mod domain;

/// Application layer: handshake, correlation, batches, events, routing.
pub mod application;

/// Infrastructure layer: transports and the connection manager.
pub mod infrastructure;

/// Test support: an in-memory transport.
pub mod testing {
    pub use crate::infrastructure::mock::MockTransport;
}

pub use application::{BatchItem, BatchOptions, BatchResult, Subscription, SubscriptionId};
pub use domain::{
    ClientConfig, ClientError, ConnectionState, DisconnectInfo, ObsEvent, TransportError,
    UnknownFrame,
};
pub use infrastructure::{ObsClient, Transport, TransportEvent, WsTransport};

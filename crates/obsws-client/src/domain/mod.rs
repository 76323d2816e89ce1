//! Domain layer for obsws-client.
//!
//! Plain data: configuration, errors, lifecycle states, and event values.
//! Nothing here touches a socket, a channel, or the async runtime, so every
//! type can be built and asserted on directly in tests.

pub mod config;
pub mod error;
pub mod events;
pub mod state;

pub use config::ClientConfig;
pub use error::{ClientError, TransportError};
pub use events::{ObsEvent, UnknownFrame};
pub use state::{ConnectionState, DisconnectInfo};

//! Infrastructure layer: the socket and the connection that drives it.

pub mod connection;
pub mod mock;
pub mod transport;
pub mod ws_transport;

pub use connection::ObsClient;
pub use transport::{Transport, TransportEvent};
pub use ws_transport::WsTransport;

//! Application layer: protocol state that sits between the socket and the
//! caller.
//!
//! Every type here is synchronous or only awaits its own channels, so each
//! piece is tested without a socket.  The connection manager in
//! [`crate::infrastructure`] wires them to a transport.

pub mod batch;
pub mod correlator;
pub mod dispatcher;
pub mod handshake;
pub mod pending;
pub mod router;

pub use batch::{BatchCoordinator, BatchItem, BatchOptions, BatchResult};
pub use correlator::RequestCorrelator;
pub use dispatcher::{EventDispatcher, Subscription, SubscriptionId};
pub use handshake::{Handshake, HandshakePhase};
pub use pending::Completion;
pub use router::{route, Routed};

//! # obsws-core
//!
//! Shared library for the OBS WebSocket v5 client containing the wire
//! envelope codec, protocol tables, challenge-response authentication, and
//! the request specs every remote operation rides on.
//!
//! It has zero dependencies on sockets or async runtimes; the connection
//! engine lives in `obsws-client`.
//!
//! # Architecture overview (for beginners)
//!
//! OBS Studio exposes a remote-control API over a single WebSocket.  Every
//! text frame on that socket is a small JSON envelope:
//!
//! ```json
//! { "op": 6, "d": { "requestType": "GetVersion", "requestId": "..." } }
//! ```
//!
//! `op` says what role the frame plays (handshake, request, response, event)
//! and `d` carries the payload.  This crate defines:
//!
//! - **`protocol`** – The envelope codec, the operation codes, the payload
//!   shapes of every frame, the status/close-code tables, the event
//!   subscription bitmask, and the authentication hash.
//!
//! - **`request`** – [`RequestSpec`] (the untyped body of a request) and
//!   [`Request<T>`](request::Request), which pairs a spec with a parser for
//!   its typed result.  A representative set of builders lives in the
//!   `general`, `stream`, `scenes`, and `inputs` submodules.
//!
//! - **`events`** – Typed parsers for event payloads the client derives
//!   local state from (output started/stopped edges).

pub mod events;
pub mod protocol;
pub mod request;

// Re-export the most-used types at the crate root so callers can write
// `obsws_core::RequestSpec` instead of `obsws_core::request::RequestSpec`.
pub use protocol::auth::compute_auth_token;
pub use protocol::codec::{decode_frame, encode_frame, CodecError, InboundFrame, OutboundFrame};
pub use protocol::opcode::OpCode;
pub use protocol::status::{CloseCode, RequestStatus};
pub use protocol::subscription::EventSubscription;
pub use request::batch::ExecutionType;
pub use request::{Request, RequestSpec, ResponseParseError, SourceId};

//! Protocol module containing the envelope codec, payload types, and wire tables.

pub mod auth;
pub mod codec;
pub mod messages;
pub mod opcode;
pub mod status;
pub mod subscription;

pub use codec::{decode_frame, encode_frame, CodecError, InboundFrame, OutboundFrame};
pub use messages::*;
pub use opcode::OpCode;
pub use status::{CloseCode, RequestStatus};
pub use subscription::EventSubscription;

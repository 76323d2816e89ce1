//! Opcode routing.
//!
//! Turns one inbound text frame into the [`Routed`] action the connection
//! should take.  Decoding never fails the connection: bad envelopes are
//! reported as [`Routed::Invalid`] and logged, and payloads that do not fit
//! their opcode are reported as [`Routed::Malformed`] so that, when a
//! `requestId` survived, only that one waiter is failed.

use obsws_core::protocol::messages::{
    EventPayload, HelloPayload, IdentifiedPayload, RequestBatchResponsePayload,
    RequestResponsePayload,
};
use obsws_core::{decode_frame, CodecError, InboundFrame};
use tracing::{trace, warn};

use crate::domain::UnknownFrame;

#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Hello(HelloPayload),
    Identified(IdentifiedPayload),
    Event(EventPayload),
    Response(RequestResponsePayload),
    BatchResponse(RequestBatchResponsePayload),
    /// Opcode not handled by this client; forwarded to the catch-all.
    Unknown(UnknownFrame),
    /// Known opcode whose payload had the wrong shape.
    Malformed {
        op: i64,
        request_id: Option<String>,
        reason: String,
    },
    /// Not a frame at all (bad JSON, missing `op`/`d`).
    Invalid(String),
}

/// Classifies one text frame received from the server.
pub fn route(text: &str) -> Routed {
    match decode_frame(text) {
        Ok(frame) => {
            trace!(op = frame.op(), "frame received");
            match frame {
                InboundFrame::Hello(hello) => Routed::Hello(hello),
                InboundFrame::Identified(identified) => Routed::Identified(identified),
                InboundFrame::Event(event) => Routed::Event(event),
                InboundFrame::RequestResponse(response) => Routed::Response(response),
                InboundFrame::RequestBatchResponse(response) => Routed::BatchResponse(response),
                InboundFrame::Unknown { op, d } => {
                    warn!(op, "frame with unhandled opcode");
                    Routed::Unknown(UnknownFrame { op, d })
                }
            }
        }
        Err(CodecError::MalformedPayload {
            op,
            request_id,
            reason,
        }) => {
            warn!(op, request_id = ?request_id, %reason, "malformed payload");
            Routed::Malformed {
                op,
                request_id,
                reason,
            }
        }
        Err(e) => {
            warn!(error = %e, "discarding undecodable frame");
            Routed::Invalid(e.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

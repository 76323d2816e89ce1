//! Envelope codec for OBS WebSocket text frames.
//!
//! Wire format:
//! ```text
//! { "op": <integer>, "d": <object> }
//! ```
//! Every frame is one UTF-8 JSON object.  `op` selects the payload shape of
//! `d` (see [`OpCode`]).  Decoding is split in two steps: the envelope must
//! be well formed or the frame is rejected outright, but an unrecognised
//! `op` is *not* an error; it yields [`InboundFrame::Unknown`] so the
//! caller can forward it to a catch-all channel.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{
    EventPayload, HelloPayload, IdentifiedPayload, IdentifyPayload, ReidentifyPayload,
    RequestBatchPayload, RequestBatchResponsePayload, RequestResponsePayload,
};
use crate::protocol::opcode::OpCode;
use crate::request::RequestSpec;

/// Errors that can occur while encoding or decoding an envelope.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not a JSON object.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    /// The envelope lacks `op` or `d`, or `op` is not an integer.
    #[error("envelope is missing field `{0}`")]
    MissingField(&'static str),

    /// `d` does not match the shape its opcode requires.
    ///
    /// `request_id` is filled in when the payload still carried a readable
    /// `requestId`, so a response can be failed individually.
    #[error("malformed payload for op {op}: {reason}")]
    MalformedPayload {
        op: i64,
        request_id: Option<String>,
        reason: String,
    },

    /// Serialising an outbound payload failed.
    #[error("failed to serialise frame: {0}")]
    Serialize(String),
}

/// A decoded frame the server sent.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Hello(HelloPayload),
    Identified(IdentifiedPayload),
    Event(EventPayload),
    RequestResponse(RequestResponsePayload),
    RequestBatchResponse(RequestBatchResponsePayload),
    /// Any opcode this client does not expect to receive, with its raw payload.
    Unknown { op: i64, d: Value },
}

impl InboundFrame {
    /// The numeric opcode this frame arrived with.
    pub fn op(&self) -> i64 {
        match self {
            InboundFrame::Hello(_) => OpCode::Hello.code().into(),
            InboundFrame::Identified(_) => OpCode::Identified.code().into(),
            InboundFrame::Event(_) => OpCode::Event.code().into(),
            InboundFrame::RequestResponse(_) => OpCode::RequestResponse.code().into(),
            InboundFrame::RequestBatchResponse(_) => OpCode::RequestBatchResponse.code().into(),
            InboundFrame::Unknown { op, .. } => *op,
        }
    }
}

/// A frame the client sends.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    Identify(IdentifyPayload),
    Reidentify(ReidentifyPayload),
    Request(RequestSpec),
    RequestBatch(RequestBatchPayload),
}

impl OutboundFrame {
    pub fn op_code(&self) -> OpCode {
        match self {
            OutboundFrame::Identify(_) => OpCode::Identify,
            OutboundFrame::Reidentify(_) => OpCode::Reidentify,
            OutboundFrame::Request(_) => OpCode::Request,
            OutboundFrame::RequestBatch(_) => OpCode::RequestBatch,
        }
    }
}

#[derive(Serialize)]
struct Envelope<T> {
    op: u8,
    d: T,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an outbound frame into the text sent on the socket.
///
/// # Errors
///
/// Returns [`CodecError::Serialize`] if the payload cannot be serialised.
///
/// # Examples
///
/// ```rust
/// use obsws_core::{encode_frame, OutboundFrame, RequestSpec};
///
/// let spec = RequestSpec::with_id("GetVersion", "abc", None);
/// let text = encode_frame(&OutboundFrame::Request(spec)).unwrap();
/// assert_eq!(text, r#"{"op":6,"d":{"requestType":"GetVersion","requestId":"abc"}}"#);
/// ```
pub fn encode_frame(frame: &OutboundFrame) -> Result<String, CodecError> {
    let op = frame.op_code().code();
    let result = match frame {
        OutboundFrame::Identify(d) => serde_json::to_string(&Envelope { op, d }),
        OutboundFrame::Reidentify(d) => serde_json::to_string(&Envelope { op, d }),
        OutboundFrame::Request(d) => serde_json::to_string(&Envelope { op, d }),
        OutboundFrame::RequestBatch(d) => serde_json::to_string(&Envelope { op, d }),
    };
    result.map_err(|e| CodecError::Serialize(e.to_string()))
}

/// Decodes one text frame received from the server.
///
/// # Errors
///
/// Returns [`CodecError`] when the envelope itself is malformed or when the
/// payload of a known inbound opcode does not have the required shape.
/// Unknown opcodes are not errors.
///
/// # Examples
///
/// ```rust
/// use obsws_core::{decode_frame, InboundFrame};
///
/// let frame = decode_frame(r#"{"op":2,"d":{"negotiatedRpcVersion":1}}"#).unwrap();
/// assert!(matches!(frame, InboundFrame::Identified(_)));
///
/// let unknown = decode_frame(r#"{"op":42,"d":{}}"#).unwrap();
/// assert_eq!(unknown.op(), 42);
/// ```
pub fn decode_frame(text: &str) -> Result<InboundFrame, CodecError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| CodecError::InvalidJson(e.to_string()))?;
    let Value::Object(mut envelope) = value else {
        return Err(CodecError::InvalidJson("envelope is not an object".into()));
    };

    let op = envelope
        .get("op")
        .and_then(Value::as_i64)
        .ok_or(CodecError::MissingField("op"))?;
    let d = envelope.remove("d").ok_or(CodecError::MissingField("d"))?;

    let frame = match OpCode::try_from(op) {
        Ok(OpCode::Hello) => InboundFrame::Hello(payload(op, d)?),
        Ok(OpCode::Identified) => InboundFrame::Identified(payload(op, d)?),
        Ok(OpCode::Event) => InboundFrame::Event(payload(op, d)?),
        Ok(OpCode::RequestResponse) => InboundFrame::RequestResponse(payload(op, d)?),
        Ok(OpCode::RequestBatchResponse) => InboundFrame::RequestBatchResponse(payload(op, d)?),
        // Outbound-only opcodes arriving from the server are as unexpected
        // as undefined ones.
        Ok(_) | Err(_) => InboundFrame::Unknown { op, d },
    };
    Ok(frame)
}

// ── Private helpers ───────────────────────────────────────────────────────────

fn payload<T: DeserializeOwned>(op: i64, d: Value) -> Result<T, CodecError> {
    let request_id = d
        .get("requestId")
        .and_then(Value::as_str)
        .map(str::to_owned);
    serde_json::from_value(d).map_err(|e| CodecError::MalformedPayload {
        op,
        request_id,
        reason: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::status::RequestStatus;
    use crate::protocol::subscription::EventSubscription;
    use crate::request::batch::ExecutionType;
    use serde_json::json;

    fn decode_json(value: Value) -> Result<InboundFrame, CodecError> {
        decode_frame(&value.to_string())
    }

    #[test]
    fn test_decode_hello() {
        let frame = decode_json(json!({
            "op": 0,
            "d": { "obsWebSocketVersion": "5.0.0", "rpcVersion": 1 }
        }))
        .unwrap();

        match frame {
            InboundFrame::Hello(hello) => assert_eq!(hello.obs_web_socket_version, "5.0.0"),
            other => panic!("expected Hello, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_request_response_preserves_data() {
        // Arrange
        let text = json!({
            "op": 7,
            "d": {
                "requestType": "GetInputMute",
                "requestId": "r-1",
                "requestStatus": { "result": true, "code": 100 },
                "responseData": { "inputMuted": true }
            }
        });

        // Act
        let frame = decode_json(text).unwrap();

        // Assert
        let InboundFrame::RequestResponse(response) = frame else {
            panic!("expected RequestResponse");
        };
        assert_eq!(response.request_id, "r-1");
        assert_eq!(response.request_status.code, RequestStatus::Success);
        assert_eq!(response.response_data, Some(json!({ "inputMuted": true })));
    }

    #[test]
    fn test_unknown_opcode_is_not_an_error() {
        let frame = decode_json(json!({ "op": 4, "d": { "x": 1 } })).unwrap();
        assert_eq!(frame, InboundFrame::Unknown { op: 4, d: json!({ "x": 1 }) });
    }

    #[test]
    fn test_outbound_opcode_received_inbound_is_unknown() {
        let frame = decode_json(json!({ "op": 6, "d": {} })).unwrap();
        assert_eq!(frame.op(), 6);
        assert!(matches!(frame, InboundFrame::Unknown { .. }));
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        let err = decode_frame("{not json").unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));

        let err = decode_frame("[1, 2]").unwrap_err();
        assert!(matches!(err, CodecError::InvalidJson(_)));
    }

    #[test]
    fn test_missing_envelope_fields_are_reported() {
        assert_eq!(
            decode_json(json!({ "d": {} })).unwrap_err(),
            CodecError::MissingField("op")
        );
        assert_eq!(
            decode_json(json!({ "op": "seven", "d": {} })).unwrap_err(),
            CodecError::MissingField("op")
        );
        assert_eq!(
            decode_json(json!({ "op": 7 })).unwrap_err(),
            CodecError::MissingField("d")
        );
    }

    #[test]
    fn test_malformed_response_keeps_request_id() {
        // requestStatus is missing entirely.
        let err = decode_json(json!({
            "op": 7,
            "d": { "requestType": "GetVersion", "requestId": "abc" }
        }))
        .unwrap_err();

        match err {
            CodecError::MalformedPayload { op, request_id, .. } => {
                assert_eq!(op, 7);
                assert_eq!(request_id.as_deref(), Some("abc"));
            }
            other => panic!("expected MalformedPayload, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_identify() {
        // Arrange
        let frame = OutboundFrame::Identify(IdentifyPayload {
            rpc_version: 1,
            authentication: Some("token".into()),
            event_subscriptions: EventSubscription::SCENES,
        });

        // Act
        let text = encode_frame(&frame).unwrap();

        // Assert
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({
                "op": 1,
                "d": { "rpcVersion": 1, "authentication": "token", "eventSubscriptions": 4 }
            })
        );
    }

    #[test]
    fn test_encode_reidentify() {
        let frame = OutboundFrame::Reidentify(ReidentifyPayload {
            event_subscriptions: EventSubscription::NONE,
        });
        let value: Value = serde_json::from_str(&encode_frame(&frame).unwrap()).unwrap();
        assert_eq!(value, json!({ "op": 3, "d": { "eventSubscriptions": 0 } }));
    }

    #[test]
    fn test_encode_batch() {
        let frame = OutboundFrame::RequestBatch(RequestBatchPayload {
            request_id: "batch".into(),
            halt_on_failure: false,
            execution_type: ExecutionType::SerialFrame,
            requests: vec![RequestSpec::with_id(
                "Sleep",
                "s1",
                Some(json!({ "sleepFrames": 3 })),
            )],
        });

        let value: Value = serde_json::from_str(&encode_frame(&frame).unwrap()).unwrap();

        assert_eq!(value["op"], json!(8));
        assert_eq!(value["d"]["executionType"], json!(1));
        assert_eq!(value["d"]["requests"][0]["requestData"]["sleepFrames"], json!(3));
    }
}

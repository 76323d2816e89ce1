//! Payload shapes carried in the `d` field of each envelope.
//!
//! All field names are camelCase on the wire.  Optional fields the server may
//! omit are `Option`s; fields the client may omit when sending are skipped
//! when `None` so the server never sees an explicit `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::status::RequestStatus;
use crate::protocol::subscription::EventSubscription;
use crate::request::batch::ExecutionType;
use crate::request::RequestSpec;

/// The RPC version this crate speaks.
pub const RPC_VERSION: u32 = 1;

// ── Handshake ─────────────────────────────────────────────────────────────────

/// op 0: first frame the server sends after the socket opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloPayload {
    #[serde(default)]
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    /// Present only when the server requires a password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthChallenge>,
}

/// Salt and challenge used by [`compute_auth_token`](crate::compute_auth_token).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// op 1: the client's reply to Hello.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyPayload {
    pub rpc_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    pub event_subscriptions: EventSubscription,
}

/// op 2: handshake accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedPayload {
    pub negotiated_rpc_version: u32,
}

/// op 3: replace the subscription mask on a live session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReidentifyPayload {
    pub event_subscriptions: EventSubscription,
}

// ── Events ────────────────────────────────────────────────────────────────────

/// op 5: an asynchronous notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub event_type: String,
    /// The subscription bit the server filtered this event by.
    #[serde(default)]
    pub event_intent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_data: Option<Value>,
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Outcome block present on every response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestStatusPayload {
    pub result: bool,
    pub code: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// op 7, and each element of a batch response's `results`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponsePayload {
    #[serde(default)]
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatusPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_data: Option<Value>,
}

/// op 8: several requests under one correlation id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBatchPayload {
    pub request_id: String,
    pub halt_on_failure: bool,
    pub execution_type: ExecutionType,
    pub requests: Vec<RequestSpec>,
}

/// op 9: per-request results of a batch.  The server may return fewer
/// results than requests (halt on failure) and in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBatchResponsePayload {
    pub request_id: String,
    #[serde(default)]
    pub results: Vec<RequestResponsePayload>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hello_without_authentication() {
        let hello: HelloPayload = serde_json::from_value(json!({
            "obsWebSocketVersion": "5.5.0",
            "rpcVersion": 1
        }))
        .unwrap();

        assert_eq!(hello.rpc_version, 1);
        assert!(hello.authentication.is_none());
    }

    #[test]
    fn test_hello_with_authentication() {
        let hello: HelloPayload = serde_json::from_value(json!({
            "obsWebSocketVersion": "5.5.0",
            "rpcVersion": 1,
            "authentication": { "challenge": "c", "salt": "s" }
        }))
        .unwrap();

        let auth = hello.authentication.unwrap();
        assert_eq!(auth.challenge, "c");
        assert_eq!(auth.salt, "s");
    }

    #[test]
    fn test_identify_omits_authentication_when_absent() {
        // Arrange
        let identify = IdentifyPayload {
            rpc_version: 1,
            authentication: None,
            event_subscriptions: EventSubscription::ALL,
        };

        // Act
        let value = serde_json::to_value(&identify).unwrap();

        // Assert
        assert_eq!(value, json!({ "rpcVersion": 1, "eventSubscriptions": 2047 }));
    }

    #[test]
    fn test_response_with_unknown_status_code_is_accepted() {
        let response: RequestResponsePayload = serde_json::from_value(json!({
            "requestType": "GetVersion",
            "requestId": "r1",
            "requestStatus": { "result": false, "code": 9999, "comment": "new" }
        }))
        .unwrap();

        assert_eq!(response.request_status.code, RequestStatus::Other(9999));
        assert_eq!(response.request_status.comment.as_deref(), Some("new"));
        assert!(response.response_data.is_none());
    }

    #[test]
    fn test_batch_serializes_execution_type_as_integer() {
        let batch = RequestBatchPayload {
            request_id: "b".into(),
            halt_on_failure: true,
            execution_type: ExecutionType::Parallel,
            requests: vec![RequestSpec::with_id("GetVersion", "x", None)],
        };

        let value = serde_json::to_value(&batch).unwrap();

        assert_eq!(value["executionType"], json!(2));
        assert_eq!(value["haltOnFailure"], json!(true));
        assert_eq!(
            value["requests"][0],
            json!({ "requestType": "GetVersion", "requestId": "x" })
        );
    }
}

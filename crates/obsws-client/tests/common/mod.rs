//! Shared helpers: a client wired to a `MockTransport` that plays the server.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use obsws_client::testing::MockTransport;
use obsws_client::{ClientConfig, ObsClient};
use serde_json::{json, Value};

pub fn hello(authentication: Option<(&str, &str)>) -> Value {
    let mut d = json!({ "obsWebSocketVersion": "5.5.0", "rpcVersion": 1 });
    if let Some((challenge, salt)) = authentication {
        d["authentication"] = json!({ "challenge": challenge, "salt": salt });
    }
    json!({ "op": 0, "d": d })
}

pub fn identified() -> Value {
    json!({ "op": 2, "d": { "negotiatedRpcVersion": 1 } })
}

pub fn success(sent: &Value, response_data: Value) -> Value {
    json!({
        "op": 7,
        "d": {
            "requestType": sent["d"]["requestType"].clone(),
            "requestId": sent["d"]["requestId"].clone(),
            "requestStatus": { "result": true, "code": 100 },
            "responseData": response_data
        }
    })
}

pub fn sent_id(sent: &Value) -> String {
    sent["d"]["requestId"].as_str().unwrap_or_default().to_string()
}

/// Connects `config` over a mock and completes the handshake.
pub async fn identified_client_with(config: ClientConfig) -> (ObsClient, MockTransport) {
    let mock = MockTransport::new();
    let client = ObsClient::new(config, Arc::new(mock.clone()));
    client.connect().await.expect("mock connect");

    mock.inject_json(&hello(None));
    let identify = mock.next_sent_json().await;
    assert_eq!(identify["op"], 1);
    mock.inject_json(&identified());
    client
        .wait_until_identified(Duration::from_secs(5))
        .await
        .expect("handshake");
    (client, mock)
}

pub async fn identified_client() -> (ObsClient, MockTransport) {
    identified_client_with(ClientConfig::default()).await
}

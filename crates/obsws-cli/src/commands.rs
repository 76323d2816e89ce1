//! The operations the `obsws` binary can run against a connected client.
//!
//! One-shot queries ([`Query`]) issue a request or a batch and produce a JSON
//! value for printing.  [`tail_events`] streams events until a count is
//! reached or the caller stops polling it.

use clap::Subcommand;
use obsws_client::{BatchOptions, ClientError, ObsClient, ObsEvent, SubscriptionId};
use obsws_core::request::{general, inputs, scenes, stream};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// `--data` was valid JSON but not an object.
    #[error("request data must be a JSON object")]
    DataNotObject,
}

/// Queries that send one request (or one batch) and print the result.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Query {
    /// Print OBS and obs-websocket versions.
    Version,
    /// Print performance statistics.
    Stats,
    /// Print the stream output status.
    StreamStatus,
    /// List scenes and the current program scene.
    Scenes,
    /// Switch the program scene.
    SetScene { name: String },
    /// Start the stream if stopped, stop it if running.
    ToggleStream,
    /// Toggle an input's mute state.
    ToggleMute { input: String },
    /// Print the mute state of several inputs with a single batch.
    MuteStatus {
        #[arg(required = true)]
        inputs: Vec<String>,
    },
    /// Send any request type by name and print its raw response data.
    Request {
        request_type: String,
        /// Request data as a JSON object.
        #[arg(long)]
        data: Option<String>,
    },
}

/// Runs `query` and returns the value to print.
pub async fn execute(client: &ObsClient, query: Query) -> Result<Value, CommandError> {
    let value = match query {
        Query::Version => serde_json::to_value(client.send_request(general::get_version()).await?)?,
        Query::Stats => serde_json::to_value(client.send_request(general::get_stats()).await?)?,
        Query::StreamStatus => {
            serde_json::to_value(client.send_request(stream::get_stream_status()).await?)?
        }
        Query::Scenes => serde_json::to_value(client.send_request(scenes::get_scene_list()).await?)?,
        Query::SetScene { name } => {
            client
                .send_request(scenes::set_current_program_scene(name.as_str()))
                .await?;
            json!({ "currentProgramSceneName": name })
        }
        Query::ToggleStream => {
            let active = client.send_request(stream::toggle_stream()).await?;
            json!({ "outputActive": active })
        }
        Query::ToggleMute { input } => {
            let muted = client
                .send_request(inputs::toggle_input_mute(input.as_str()))
                .await?;
            json!({ "inputName": input, "inputMuted": muted })
        }
        Query::MuteStatus { inputs: names } => {
            let selected = client
                .select_results(
                    names,
                    |name| inputs::get_input_mute(name.as_str()),
                    |name, result| match result {
                        Ok(muted) => Some(Value::Bool(muted)),
                        Err(e) => {
                            debug!(input = %name, error = %e, "mute state unavailable");
                            None
                        }
                    },
                    BatchOptions::default(),
                )
                .await?;
            Value::Object(selected.into_iter().collect::<Map<String, Value>>())
        }
        Query::Request { request_type, data } => {
            let data = data.as_deref().map(parse_request_data).transpose()?;
            client
                .send_raw_request(&request_type, data, None)
                .await?
                .unwrap_or(Value::Null)
        }
    };
    Ok(value)
}

fn parse_request_data(text: &str) -> Result<Value, CommandError> {
    let value: Value = serde_json::from_str(text)?;
    if value.is_object() {
        Ok(value)
    } else {
        Err(CommandError::DataNotObject)
    }
}

/// JSON form of one event, as printed by the `events` command.
pub fn event_to_json(event: &ObsEvent) -> Value {
    json!({
        "eventType": event.event_type,
        "eventIntent": event.event_intent,
        "synthesized": event.synthesized,
        "eventData": event.event_data,
    })
}

/// Streams events of the given types, plus every event the client does not
/// recognise, into `emit`.
///
/// Returns after `count` events, or when every subscription has closed.
pub async fn tail_events<F>(client: &ObsClient, event_types: &[String], count: Option<usize>, mut emit: F)
where
    F: FnMut(&ObsEvent),
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut ids: Vec<SubscriptionId> = Vec::new();
    let mut forwarders = Vec::new();

    let subscriptions = event_types
        .iter()
        .map(|event_type| client.subscribe(event_type))
        .chain(std::iter::once(client.subscribe_unknown_events()));
    for mut subscription in subscriptions {
        ids.push(subscription.id());
        let tx = tx.clone();
        forwarders.push(tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    let mut seen = 0usize;
    while let Some(event) = rx.recv().await {
        emit(&event);
        seen += 1;
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
    }

    for id in ids {
        client.unsubscribe(id);
    }
    for forwarder in forwarders {
        forwarder.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use obsws_client::testing::MockTransport;
    use obsws_client::ClientConfig;

    async fn identified() -> (ObsClient, MockTransport) {
        let mock = MockTransport::new();
        let client = ObsClient::new(ClientConfig::default(), Arc::new(mock.clone()));
        client.connect().await.unwrap();
        mock.inject_json(&json!({ "op": 0, "d": { "obsWebSocketVersion": "5.5.0", "rpcVersion": 1 } }));
        mock.next_sent_json().await;
        mock.inject_json(&json!({ "op": 2, "d": { "negotiatedRpcVersion": 1 } }));
        client
            .wait_until_identified(Duration::from_secs(5))
            .await
            .unwrap();
        (client, mock)
    }

    fn respond(sent: &Value, data: Value) -> Value {
        json!({
            "op": 7,
            "d": {
                "requestType": sent["d"]["requestType"].clone(),
                "requestId": sent["d"]["requestId"].clone(),
                "requestStatus": { "result": true, "code": 100 },
                "responseData": data
            }
        })
    }

    #[test]
    fn test_request_data_must_be_an_object() {
        assert!(parse_request_data(r#"{"sleepMillis": 10}"#).is_ok());
        assert!(matches!(parse_request_data("[1, 2]"), Err(CommandError::DataNotObject)));
        assert!(matches!(parse_request_data("{oops"), Err(CommandError::Json(_))));
    }

    #[tokio::test]
    async fn test_toggle_mute_reports_new_state() {
        // Arrange
        let (client, mock) = identified().await;
        let task = tokio::spawn({
            let client = client.clone();
            async move { execute(&client, Query::ToggleMute { input: "Mic".into() }).await }
        });

        // Act
        let sent = mock.next_sent_json().await;
        mock.inject_json(&respond(&sent, json!({ "inputMuted": true })));
        let value = task.await.unwrap().unwrap();

        // Assert
        assert_eq!(sent["d"]["requestType"], "ToggleInputMute");
        assert_eq!(sent["d"]["requestData"]["inputName"], "Mic");
        assert_eq!(value, json!({ "inputName": "Mic", "inputMuted": true }));
    }

    #[tokio::test]
    async fn test_raw_request_forwards_data() {
        let (client, mock) = identified().await;
        let task = tokio::spawn({
            let client = client.clone();
            async move {
                execute(
                    &client,
                    Query::Request {
                        request_type: "GetHotkeyList".into(),
                        data: Some(r#"{"x": 1}"#.into()),
                    },
                )
                .await
            }
        });

        let sent = mock.next_sent_json().await;
        mock.inject_json(&respond(&sent, json!({ "hotkeys": [] })));

        assert_eq!(sent["d"]["requestData"], json!({ "x": 1 }));
        assert_eq!(task.await.unwrap().unwrap(), json!({ "hotkeys": [] }));
    }

    #[tokio::test]
    async fn test_mute_status_skips_failed_inputs() {
        // Arrange
        let (client, mock) = identified().await;
        let task = tokio::spawn({
            let client = client.clone();
            async move {
                execute(
                    &client,
                    Query::MuteStatus {
                        inputs: vec!["Mic".into(), "Gone".into()],
                    },
                )
                .await
            }
        });

        // Act
        let sent = mock.next_sent_json().await;
        let subs = sent["d"]["requests"].as_array().cloned().unwrap();
        mock.inject_json(&json!({
            "op": 9,
            "d": {
                "requestId": sent["d"]["requestId"].clone(),
                "results": [
                    {
                        "requestType": "GetInputMute",
                        "requestId": subs[1]["requestId"].clone(),
                        "requestStatus": { "result": false, "code": 600 }
                    },
                    {
                        "requestType": "GetInputMute",
                        "requestId": subs[0]["requestId"].clone(),
                        "requestStatus": { "result": true, "code": 100 },
                        "responseData": { "inputMuted": false }
                    }
                ]
            }
        }));

        // Assert
        assert_eq!(task.await.unwrap().unwrap(), json!({ "Mic": false }));
    }

    #[tokio::test]
    async fn test_query_before_identify_fails() {
        let mock = MockTransport::new();
        let client = ObsClient::new(ClientConfig::default(), Arc::new(mock));

        let result = execute(&client, Query::Version).await;

        assert!(matches!(
            result,
            Err(CommandError::Client(ClientError::NotIdentified))
        ));
    }

    #[tokio::test]
    async fn test_tail_events_stops_after_count() {
        // Arrange
        let (client, mock) = identified().await;
        let types = vec!["SceneCreated".to_string(), "SceneRemoved".to_string()];
        let mut seen = Vec::new();

        // Act: the tail subscribes on its first poll, before the frames arrive.
        let tail = tail_events(&client, &types, Some(3), |event| {
            seen.push(event.event_type.clone())
        });
        let server = async {
            for (event_type, data) in [
                ("SceneCreated", json!({ "sceneName": "A" })),
                ("SomethingNew", json!({})),
                ("SceneRemoved", json!({ "sceneName": "A" })),
            ] {
                mock.inject_json(&json!({
                    "op": 5,
                    "d": { "eventType": event_type, "eventIntent": 4, "eventData": data }
                }));
            }
        };
        tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(tail, server);
        })
        .await
        .unwrap();

        // Assert
        seen.sort();
        assert_eq!(seen, vec!["SceneCreated", "SceneRemoved", "SomethingNew"]);
    }

    #[test]
    fn test_event_json_shape() {
        let event = ObsEvent::derived("RecordStarted", Some(json!({ "outputActive": true })));

        let value = event_to_json(&event);

        assert_eq!(value["eventType"], "RecordStarted");
        assert_eq!(value["synthesized"], true);
        assert_eq!(value["eventData"]["outputActive"], true);
    }
}

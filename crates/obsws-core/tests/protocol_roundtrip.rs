//! Integration tests for the obsws-core public API.
//!
//! Each test builds an outbound frame with a request builder, encodes it,
//! fabricates the server's reply from the encoded text, and decodes the reply
//! back through the codec and the request's own parser.

use obsws_core::protocol::messages::RequestResponsePayload;
use obsws_core::request::{general, inputs, scenes, stream};
use obsws_core::{
    compute_auth_token, decode_frame, encode_frame, InboundFrame, OutboundFrame, Request,
    RequestStatus,
};
use serde_json::{json, Value};

/// Encodes `request`, answers it with `response_data`, and returns what the
/// request's parser makes of the decoded response.
fn answer<T>(request: &Request<T>, response_data: Value) -> T {
    let text = encode_frame(&OutboundFrame::Request(request.spec().clone()))
        .expect("encode must succeed");
    let sent: Value = serde_json::from_str(&text).expect("encoded frame must be JSON");
    assert_eq!(sent["op"], json!(6));
    let request_type = sent["d"]["requestType"].clone();
    let request_id = sent["d"]["requestId"].clone();

    let reply = json!({
        "op": 7,
        "d": {
            "requestType": request_type,
            "requestId": request_id,
            "requestStatus": { "result": true, "code": 100 },
            "responseData": response_data
        }
    });
    let InboundFrame::RequestResponse(RequestResponsePayload {
        request_id,
        request_status,
        response_data,
        ..
    }) = decode_frame(&reply.to_string()).expect("decode must succeed")
    else {
        panic!("reply must decode as a RequestResponse");
    };

    assert_eq!(request_id, request.id());
    assert_eq!(request_status.code, RequestStatus::Success);
    request.parse(response_data).expect("parse must succeed")
}

#[test]
fn test_roundtrip_stream_status() {
    let status = answer(
        &stream::get_stream_status(),
        json!({
            "outputActive": true,
            "outputReconnecting": true,
            "outputTimecode": "01:00:00.000",
            "outputDuration": 3600000.0,
            "outputCongestion": 0.5,
            "outputBytes": 42,
            "outputSkippedFrames": 7,
            "outputTotalFrames": 108000
        }),
    );

    assert!(status.active);
    assert!(status.reconnecting);
    assert_eq!(status.skipped_frames, 7);
    assert_eq!(status.total_frames, 108_000);
}

#[test]
fn test_roundtrip_scene_list() {
    let list = answer(
        &scenes::get_scene_list(),
        json!({
            "currentProgramSceneName": "B",
            "currentProgramSceneUuid": "ub",
            "scenes": [
                { "sceneName": "C", "sceneUuid": "uc", "sceneIndex": 2 },
                { "sceneName": "B", "sceneUuid": "ub", "sceneIndex": 1 },
                { "sceneName": "A", "sceneUuid": "ua", "sceneIndex": 0 }
            ]
        }),
    );

    let names: Vec<&str> = list.scenes.iter().map(|s| s.scene_name.as_str()).collect();
    assert_eq!(names, ["C", "B", "A"]);
    assert_eq!(list.current_program_scene_uuid.as_deref(), Some("ub"));
}

#[test]
fn test_roundtrip_single_scalar() {
    assert!(answer(&inputs::get_input_mute("Mic"), json!({ "inputMuted": true })));
    assert!(!answer(&stream::toggle_stream(), json!({ "outputActive": false })));
}

#[test]
fn test_roundtrip_void_request() {
    answer(&general::sleep_millis(100), Value::Null);
}

#[test]
fn test_auth_vector_matches_independent_computation() {
    // base64(sha256("ps"))  = ZSfJNhovRpxSda/LXQblMBM2fNIxmV3hPcchhxE4g4I=
    // base64(sha256(that ++ "c"))
    assert_eq!(
        compute_auth_token("p", "s", "c"),
        "LEfh2WVBWpa8M06P7MehLXlToA1PtH2lNSNPjUZVYls="
    );
}

#[test]
fn test_failed_response_keeps_code_and_comment() {
    let reply = json!({
        "op": 7,
        "d": {
            "requestType": "SetCurrentProgramScene",
            "requestId": "x",
            "requestStatus": { "result": false, "code": 600, "comment": "No source was found" }
        }
    });

    let InboundFrame::RequestResponse(response) = decode_frame(&reply.to_string()).unwrap() else {
        panic!("expected RequestResponse");
    };

    assert!(!response.request_status.result);
    assert_eq!(response.request_status.code, RequestStatus::ResourceNotFound);
    assert_eq!(
        response.request_status.comment.as_deref(),
        Some("No source was found")
    );
}

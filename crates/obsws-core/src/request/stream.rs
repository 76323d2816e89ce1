//! Stream output requests.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::request::{Request, RequestSpec};

/// Result of `GetStreamStatus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamStatus {
    #[serde(rename = "outputActive")]
    pub active: bool,
    #[serde(rename = "outputReconnecting")]
    pub reconnecting: bool,
    #[serde(rename = "outputTimecode")]
    pub timecode: String,
    /// Milliseconds.
    #[serde(rename = "outputDuration")]
    pub duration: f64,
    #[serde(rename = "outputCongestion")]
    pub congestion: f64,
    #[serde(rename = "outputBytes")]
    pub bytes: u64,
    #[serde(rename = "outputSkippedFrames")]
    pub skipped_frames: u64,
    #[serde(rename = "outputTotalFrames")]
    pub total_frames: u64,
}

pub fn get_stream_status() -> Request<StreamStatus> {
    Request::structured(RequestSpec::new("GetStreamStatus", None))
}

/// Toggles the stream; resolves to the new active state.
pub fn toggle_stream() -> Request<bool> {
    Request::single_field(RequestSpec::new("ToggleStream", None), "outputActive")
}

pub fn start_stream() -> Request<()> {
    Request::void(RequestSpec::new("StartStream", None))
}

pub fn stop_stream() -> Request<()> {
    Request::void(RequestSpec::new("StopStream", None))
}

/// Sends CEA-608 caption text over the stream output.
pub fn send_stream_caption(text: impl Into<String>) -> Request<()> {
    Request::void(RequestSpec::new(
        "SendStreamCaption",
        Some(json!({ "captionText": text.into() })),
    ))
}

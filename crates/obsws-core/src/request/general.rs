//! General requests: version, stats, sleeps, custom events.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::request::{Request, RequestSpec};

/// Result of `GetVersion`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub obs_version: String,
    pub obs_web_socket_version: String,
    pub rpc_version: u32,
    pub available_requests: Vec<String>,
    pub supported_image_formats: Vec<String>,
    pub platform: String,
    pub platform_description: String,
}

/// Result of `GetStats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub available_disk_space: f64,
    pub active_fps: f64,
    pub average_frame_render_time: f64,
    pub render_skipped_frames: u64,
    pub render_total_frames: u64,
    pub output_skipped_frames: u64,
    pub output_total_frames: u64,
    pub web_socket_session_incoming_messages: u64,
    pub web_socket_session_outgoing_messages: u64,
}

pub fn get_version() -> Request<VersionInfo> {
    Request::structured(RequestSpec::new("GetVersion", None))
}

pub fn get_stats() -> Request<Stats> {
    Request::structured(RequestSpec::new("GetStats", None))
}

/// Makes the server pause a serial batch for `millis` milliseconds.
///
/// Only meaningful inside a [`SerialRealtime`](super::batch::ExecutionType::SerialRealtime) batch.
pub fn sleep_millis(millis: u64) -> Request<()> {
    Request::void(RequestSpec::new("Sleep", Some(json!({ "sleepMillis": millis }))))
}

/// Makes the server pause a serial batch for `frames` rendered frames.
///
/// Only meaningful inside a [`SerialFrame`](super::batch::ExecutionType::SerialFrame) batch.
pub fn sleep_frames(frames: u64) -> Request<()> {
    Request::void(RequestSpec::new("Sleep", Some(json!({ "sleepFrames": frames }))))
}

/// Emits a `CustomEvent` to every connected client subscribed to General.
pub fn broadcast_custom_event(event_data: Value) -> Request<()> {
    Request::void(RequestSpec::new(
        "BroadcastCustomEvent",
        Some(json!({ "eventData": event_data })),
    ))
}

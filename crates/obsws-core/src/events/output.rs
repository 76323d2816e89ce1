//! Output state events (stream, record, replay buffer, virtual camera).
//!
//! Each output reports every state transition through one
//! `<Output>StateChanged` event carrying an `outputActive` flag and an
//! `outputState` identifier.  [`OutputKind`] names the four outputs and the
//! synthetic `<Output>Started` / `<Output>Stopped` events the client derives
//! from the flag.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::request::ResponseParseError;

/// The `outputState` identifier of a state-change event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputState {
    Unknown,
    Starting,
    Started,
    Stopping,
    Stopped,
    Reconnecting,
    Reconnected,
    Paused,
    Resumed,
    /// An identifier this crate does not know, preserved verbatim.
    Other(String),
}

impl OutputState {
    const TABLE: [(OutputState, &'static str); 9] = [
        (OutputState::Unknown, "OBS_WEBSOCKET_OUTPUT_UNKNOWN"),
        (OutputState::Starting, "OBS_WEBSOCKET_OUTPUT_STARTING"),
        (OutputState::Started, "OBS_WEBSOCKET_OUTPUT_STARTED"),
        (OutputState::Stopping, "OBS_WEBSOCKET_OUTPUT_STOPPING"),
        (OutputState::Stopped, "OBS_WEBSOCKET_OUTPUT_STOPPED"),
        (OutputState::Reconnecting, "OBS_WEBSOCKET_OUTPUT_RECONNECTING"),
        (OutputState::Reconnected, "OBS_WEBSOCKET_OUTPUT_RECONNECTED"),
        (OutputState::Paused, "OBS_WEBSOCKET_OUTPUT_PAUSED"),
        (OutputState::Resumed, "OBS_WEBSOCKET_OUTPUT_RESUMED"),
    ];

    /// Every known state, in declaration order.
    pub fn all() -> impl Iterator<Item = OutputState> {
        Self::TABLE.into_iter().map(|(state, _)| state)
    }

    /// Returns the wire identifier.
    pub fn as_str(&self) -> &str {
        match self {
            OutputState::Other(identifier) => identifier,
            known => Self::TABLE
                .iter()
                .find(|(state, _)| state == known)
                .map(|(_, id)| *id)
                .unwrap_or("OBS_WEBSOCKET_OUTPUT_UNKNOWN"),
        }
    }

    /// Looks up a wire identifier; unknown identifiers become `Other`.
    pub fn from_identifier(identifier: &str) -> Self {
        Self::TABLE
            .iter()
            .find(|(_, id)| *id == identifier)
            .map(|(state, _)| state.clone())
            .unwrap_or_else(|| {
                tracing::debug!(identifier, "unknown output state identifier");
                OutputState::Other(identifier.to_string())
            })
    }
}

impl Serialize for OutputState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OutputState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let identifier = String::deserialize(deserializer)?;
        Ok(Self::from_identifier(&identifier))
    }
}

/// Payload of any `<Output>StateChanged` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStateChanged {
    #[serde(rename = "outputActive")]
    pub active: bool,
    #[serde(rename = "outputState")]
    pub state: OutputState,
    /// Only the record and replay-buffer outputs report a file path.
    #[serde(rename = "outputPath", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl OutputStateChanged {
    /// Parses the `eventData` of a state-change event.
    pub fn from_event_data(data: Option<&Value>) -> Result<Self, ResponseParseError> {
        let data = data.ok_or(ResponseParseError::MissingResponseData)?;
        Self::deserialize(data).map_err(|e| ResponseParseError::Deserialize(e.to_string()))
    }
}

/// Outputs whose state events carry an active flag worth tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Stream,
    Record,
    ReplayBuffer,
    Virtualcam,
}

impl OutputKind {
    pub const ALL: [OutputKind; 4] = [
        OutputKind::Stream,
        OutputKind::Record,
        OutputKind::ReplayBuffer,
        OutputKind::Virtualcam,
    ];

    /// The raw event this output reports through.
    pub fn state_event(self) -> &'static str {
        match self {
            OutputKind::Stream => "StreamStateChanged",
            OutputKind::Record => "RecordStateChanged",
            OutputKind::ReplayBuffer => "ReplayBufferStateChanged",
            OutputKind::Virtualcam => "VirtualcamStateChanged",
        }
    }

    /// Synthetic event emitted when the output becomes active.
    pub fn started_event(self) -> &'static str {
        match self {
            OutputKind::Stream => "StreamStarted",
            OutputKind::Record => "RecordStarted",
            OutputKind::ReplayBuffer => "ReplayBufferStarted",
            OutputKind::Virtualcam => "VirtualcamStarted",
        }
    }

    /// Synthetic event emitted when the output becomes inactive.
    pub fn stopped_event(self) -> &'static str {
        match self {
            OutputKind::Stream => "StreamStopped",
            OutputKind::Record => "RecordStopped",
            OutputKind::ReplayBuffer => "ReplayBufferStopped",
            OutputKind::Virtualcam => "VirtualcamStopped",
        }
    }

    pub fn from_state_event(event_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.state_event() == event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_every_output_state_round_trips() {
        for state in OutputState::all() {
            assert_eq!(OutputState::from_identifier(state.as_str()), state);
        }
    }

    #[test]
    fn test_unknown_output_state_is_preserved() {
        let state = OutputState::from_identifier("OBS_WEBSOCKET_OUTPUT_BURNING");
        assert_eq!(state, OutputState::Other("OBS_WEBSOCKET_OUTPUT_BURNING".into()));
        assert_eq!(state.as_str(), "OBS_WEBSOCKET_OUTPUT_BURNING");
    }

    #[test]
    fn test_output_state_changed_parses_record_event() {
        // Arrange
        let data = json!({
            "outputActive": false,
            "outputState": "OBS_WEBSOCKET_OUTPUT_STOPPED",
            "outputPath": "/videos/out.mkv"
        });

        // Act
        let parsed = OutputStateChanged::from_event_data(Some(&data)).unwrap();

        // Assert
        assert!(!parsed.active);
        assert_eq!(parsed.state, OutputState::Stopped);
        assert_eq!(parsed.path.as_deref(), Some("/videos/out.mkv"));
    }

    #[test]
    fn test_output_state_changed_requires_active_flag() {
        let data = json!({ "outputState": "OBS_WEBSOCKET_OUTPUT_STARTED" });
        assert!(OutputStateChanged::from_event_data(Some(&data)).is_err());
        assert_eq!(
            OutputStateChanged::from_event_data(None),
            Err(ResponseParseError::MissingResponseData)
        );
    }

    #[test]
    fn test_output_kind_event_names_are_distinct() {
        let mut names: Vec<&str> = OutputKind::ALL
            .iter()
            .flat_map(|k| [k.state_event(), k.started_event(), k.stopped_event()])
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_output_kind_lookup_by_state_event() {
        for kind in OutputKind::ALL {
            assert_eq!(OutputKind::from_state_event(kind.state_event()), Some(kind));
        }
        assert_eq!(OutputKind::from_state_event("RecordFileChanged"), None);
    }
}

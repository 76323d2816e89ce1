//! Event values delivered to subscribers.

use obsws_core::events::OutputStateChanged;
use obsws_core::protocol::messages::EventPayload;
use obsws_core::ResponseParseError;
use serde_json::Value;

/// One notification, either received from the server or derived locally.
#[derive(Debug, Clone, PartialEq)]
pub struct ObsEvent {
    pub event_type: String,
    /// Subscription bit the server tagged the event with; 0 for derived events.
    pub event_intent: u32,
    pub event_data: Option<Value>,
    /// `true` for `<Output>Started` / `<Output>Stopped` events the client
    /// derived from a state change rather than received.
    pub synthesized: bool,
}

impl ObsEvent {
    pub fn derived(event_type: &str, event_data: Option<Value>) -> Self {
        Self {
            event_type: event_type.to_string(),
            event_intent: 0,
            event_data,
            synthesized: true,
        }
    }

    /// Parses the payload of any `<Output>StateChanged` or derived edge event.
    pub fn output_state(&self) -> Result<OutputStateChanged, ResponseParseError> {
        OutputStateChanged::from_event_data(self.event_data.as_ref())
    }
}

impl From<EventPayload> for ObsEvent {
    fn from(payload: EventPayload) -> Self {
        Self {
            event_type: payload.event_type,
            event_intent: payload.event_intent,
            event_data: payload.event_data,
            synthesized: false,
        }
    }
}

/// A frame with an opcode the client does not handle.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownFrame {
    pub op: i64,
    pub d: Value,
}

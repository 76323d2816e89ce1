//! Input requests: settings and mute state.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::{Request, RequestSpec, SourceId};

/// Result of `GetInputSettings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSettings {
    /// Only the settings that differ from the input kind's defaults.
    pub input_settings: Map<String, Value>,
    pub input_kind: String,
}

fn addressed(input: SourceId) -> Map<String, Value> {
    let mut data = Map::new();
    input.insert_into(&mut data, "input");
    data
}

pub fn get_input_settings(input: impl Into<SourceId>) -> Request<InputSettings> {
    let data = addressed(input.into());
    Request::structured(RequestSpec::new("GetInputSettings", Some(Value::Object(data))))
}

/// Applies `settings` on top of the current ones when `overlay` is true,
/// otherwise resets every other setting to its default first.
pub fn set_input_settings(
    input: impl Into<SourceId>,
    settings: Map<String, Value>,
    overlay: bool,
) -> Request<()> {
    let mut data = addressed(input.into());
    data.insert("inputSettings".into(), Value::Object(settings));
    data.insert("overlay".into(), Value::Bool(overlay));
    Request::void(RequestSpec::new("SetInputSettings", Some(Value::Object(data))))
}

pub fn get_input_mute(input: impl Into<SourceId>) -> Request<bool> {
    let data = addressed(input.into());
    Request::single_field(
        RequestSpec::new("GetInputMute", Some(Value::Object(data))),
        "inputMuted",
    )
}

/// Toggles mute; resolves to the new muted state.
pub fn toggle_input_mute(input: impl Into<SourceId>) -> Request<bool> {
    let data = addressed(input.into());
    Request::single_field(
        RequestSpec::new("ToggleInputMute", Some(Value::Object(data))),
        "inputMuted",
    )
}

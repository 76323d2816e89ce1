//! Scene requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::request::{Request, RequestSpec, SourceId};

/// One entry of `GetSceneList`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneListItem {
    pub scene_name: String,
    pub scene_uuid: String,
    pub scene_index: i64,
}

/// Result of `GetSceneList`.
///
/// The preview fields are `None` when studio mode is off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneList {
    #[serde(default)]
    pub current_program_scene_name: Option<String>,
    #[serde(default)]
    pub current_program_scene_uuid: Option<String>,
    #[serde(default)]
    pub current_preview_scene_name: Option<String>,
    #[serde(default)]
    pub current_preview_scene_uuid: Option<String>,
    pub scenes: Vec<SceneListItem>,
}

/// Result of `GetCurrentProgramScene`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentScene {
    pub scene_name: String,
    pub scene_uuid: String,
}

pub fn get_scene_list() -> Request<SceneList> {
    Request::structured(RequestSpec::new("GetSceneList", None))
}

pub fn get_current_program_scene() -> Request<CurrentScene> {
    Request::structured(RequestSpec::new("GetCurrentProgramScene", None))
}

pub fn set_current_program_scene(scene: impl Into<SourceId>) -> Request<()> {
    let mut data = Map::new();
    scene.into().insert_into(&mut data, "scene");
    Request::void(RequestSpec::new("SetCurrentProgramScene", Some(Value::Object(data))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scene_list_parses_items_in_order() {
        // Arrange
        let data = json!({
            "currentProgramSceneName": "Live",
            "currentProgramSceneUuid": "u-live",
            "currentPreviewSceneName": null,
            "currentPreviewSceneUuid": null,
            "scenes": [
                { "sceneName": "Intro", "sceneUuid": "u-intro", "sceneIndex": 1 },
                { "sceneName": "Live", "sceneUuid": "u-live", "sceneIndex": 0 }
            ]
        });

        // Act
        let list = get_scene_list().parse(Some(data)).unwrap();

        // Assert
        assert_eq!(list.current_program_scene_name.as_deref(), Some("Live"));
        assert_eq!(list.current_preview_scene_name, None);
        assert_eq!(list.scenes.len(), 2);
        assert_eq!(list.scenes[0].scene_name, "Intro");
        assert_eq!(list.scenes[1].scene_index, 0);
    }

    #[test]
    fn test_set_current_program_scene_by_name_and_uuid() {
        let by_name = set_current_program_scene("Live");
        assert_eq!(by_name.spec().request_data, Some(json!({ "sceneName": "Live" })));

        let by_uuid = set_current_program_scene(SourceId::Uuid("u-1".into()));
        assert_eq!(by_uuid.spec().request_data, Some(json!({ "sceneUuid": "u-1" })));
    }

    #[test]
    fn test_current_scene_requires_both_fields() {
        let result = get_current_program_scene().parse(Some(json!({ "sceneName": "Live" })));
        assert!(result.is_err());
    }
}

use serde::{Deserialize, Serialize};
use crate::models::marker::MarkerHandle;
use crate::models::position::Position;

/// Parameters of a one-shot sound playback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoundRequest {
    pub sound_id: String,
    pub left_volume: f32,
    pub right_volume: f32,
    pub priority: i32,
    pub loop_count: i32,
    pub rate: f32,
}

impl SoundRequest {
    pub fn new(sound_id: impl Into<String>) -> Self {
        Self {
            sound_id: sound_id.into(),
            left_volume: 1.0,
            right_volume: 1.0,
            priority: 1,
            loop_count: 10,
            rate: 1.0,
        }
    }
}

/// Presentation side effects, in the form they are sent to a screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum PresentationCommand {
    RecenterCamera {
        position: Position,
        zoom: f32,
    },
    CreateMarker {
        marker: MarkerHandle,
        position: Position,
        icon: String,
    },
    MoveMarker {
        marker: MarkerHandle,
        position: Position,
    },
    PlaySound(SoundRequest),
}

/// Lifecycle notifications a screen sends to its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "lifecycle", rename_all = "snake_case")]
pub enum LifecycleEvent {
    Start,
    Resume,
    Pause,
    Stop,
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;

    #[test]
    fn commands_are_tagged() {
        let create = PresentationCommand::CreateMarker {
            marker: MarkerHandle::new(1),
            position: Position::new(39.10, -84.51),
            icon: "santa".to_string(),
        };
        assert_eq!(serde_json::to_value(&create).unwrap(), json!({
            "command": "create_marker",
            "marker": 1,
            "position": {"lat": 39.10, "lng": -84.51},
            "icon": "santa",
        }));

        let sound = PresentationCommand::PlaySound(SoundRequest::new("hohoho"));
        assert_eq!(serde_json::to_value(&sound).unwrap(), json!({
            "command": "play_sound",
            "sound_id": "hohoho",
            "left_volume": 1.0,
            "right_volume": 1.0,
            "priority": 1,
            "loop_count": 10,
            "rate": 1.0,
        }));
    }

    #[test]
    fn lifecycle_events_parse() {
        let event: LifecycleEvent = serde_json::from_str(r#"{"lifecycle":"pause"}"#).unwrap();
        assert_eq!(event, LifecycleEvent::Pause);
        assert!(serde_json::from_str::<LifecycleEvent>(r#"{"lifecycle":"destroy"}"#).is_err());
    }
}

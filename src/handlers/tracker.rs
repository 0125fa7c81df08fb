use serde_json::Value;
use tracing::{debug, info};
use crate::config::TrackerConfig;
use crate::models::commands::SoundRequest;
use crate::models::error::Result;
use crate::models::flag::HohohoFlag;
use crate::models::marker::MarkerHandle;
use crate::models::position::Position;

pub trait MapView: Send {
    fn recenter_camera(&mut self, position: Position, zoom: f32);
    fn create_marker(&mut self, position: Position, icon: &str) -> MarkerHandle;
    fn move_marker(&mut self, marker: MarkerHandle, position: Position);
}

pub trait SoundTrigger: Send {
    /// Fire-and-forget playback. There is no matching stop.
    fn play(&mut self, request: &SoundRequest);
}

/// Turns raw snapshots into map and sound side effects.
///
/// Owns the single marker of a screen. The marker is created on the first
/// position and moved on every later one.
pub struct Tracker {
    map: Box<dyn MapView>,
    sound: Box<dyn SoundTrigger>,
    config: TrackerConfig,
    marker: Option<MarkerHandle>,
    last_position: Option<Position>,
}

impl Tracker {
    pub fn new(map: Box<dyn MapView>, sound: Box<dyn SoundTrigger>, config: TrackerConfig) -> Self {
        Self {
            map,
            sound,
            config,
            marker: None,
            last_position: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn marker(&self) -> Option<MarkerHandle> {
        self.marker
    }

    pub fn last_position(&self) -> Option<Position> {
        self.last_position
    }

    /// Decodes before touching any state, so a malformed record changes nothing.
    pub fn on_position_snapshot(&mut self, raw: &Value) -> Result<Position> {
        let position = Position::from_snapshot(&self.config.location_path, raw)?;
        self.on_position_changed(position);
        Ok(position)
    }

    pub fn on_flag_snapshot(&mut self, raw: &Value) -> Result<HohohoFlag> {
        let flag = HohohoFlag::from_snapshot(&self.config.flag_path, raw)?;
        if flag.is_set() {
            self.on_hohoho_triggered();
        }
        Ok(flag)
    }

    pub fn on_position_changed(&mut self, position: Position) {
        self.last_position = Some(position);
        self.map.recenter_camera(position, self.config.camera_zoom);

        match self.marker {
            Some(marker) => {
                debug!("Moving marker {} to {:?}", marker.id(), position);
                self.map.move_marker(marker, position);
            }
            None => {
                let marker = self.map.create_marker(position, &self.config.marker_icon);
                info!("Created marker {} at {:?}", marker.id(), position);
                self.marker = Some(marker);
            }
        }
    }

    pub fn on_hohoho_triggered(&mut self) {
        info!("Ho ho ho!");
        self.sound.play(&self.config.sound);
    }
}

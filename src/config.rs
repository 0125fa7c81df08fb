use std::env;
use std::str::FromStr;
use once_cell::sync::Lazy;
use tracing::warn;
use crate::models::commands::SoundRequest;

pub static CONFIG: Lazy<TrackerConfig> = Lazy::new(TrackerConfig::init);

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub host: String,
    pub port: u16,
    /// Store path holding the `{lat, lng}` record.
    pub location_path: String,
    /// Store path holding the ho-ho-ho boolean.
    pub flag_path: String,
    pub camera_zoom: f32,
    pub marker_icon: String,
    pub sound: SoundRequest,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            location_path: "current_location".to_string(),
            flag_path: "ho_ho_hoing".to_string(),
            camera_zoom: 9.0,
            marker_icon: "santa".to_string(),
            sound: SoundRequest::new("hohoho"),
        }
    }
}

impl TrackerConfig {
    pub fn init() -> TrackerConfig {
        let defaults = TrackerConfig::default();
        let sound = SoundRequest {
            sound_id: env::var("SANTA_SOUND_ID").unwrap_or(defaults.sound.sound_id.clone()),
            priority: parsed_var("SANTA_SOUND_PRIORITY", defaults.sound.priority),
            loop_count: parsed_var("SANTA_SOUND_LOOP_COUNT", defaults.sound.loop_count),
            ..defaults.sound
        };

        TrackerConfig {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: parsed_var("PORT", defaults.port),
            location_path: env::var("SANTA_LOCATION_PATH").unwrap_or(defaults.location_path),
            flag_path: env::var("SANTA_FLAG_PATH").unwrap_or(defaults.flag_path),
            camera_zoom: parsed_var("SANTA_CAMERA_ZOOM", defaults.camera_zoom),
            marker_icon: env::var("SANTA_MARKER_ICON").unwrap_or(defaults.marker_icon),
            sound,
        }
    }
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring unparseable {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tracked_paths() {
        let config = TrackerConfig::default();
        assert_eq!(config.location_path, "current_location");
        assert_eq!(config.flag_path, "ho_ho_hoing");
        assert_eq!(config.camera_zoom, 9.0);
        assert_eq!(config.sound.loop_count, 10);
        assert_eq!(config.sound.priority, 1);
    }

    #[test]
    fn unset_variables_fall_back() {
        assert_eq!(parsed_var("SANTA_TRACKER_TEST_UNSET_VARIABLE", 7u16), 7);
    }
}

//! Engine Settings
//!
//! Plain configuration structs with sensible defaults. Every field is optional
//! when deserializing, so a config file only needs to mention what it changes.
//!
//! ```rust,ignore
//! use ziggurat_core::EngineSettings;
//!
//! let settings = EngineSettings::from_json(r#"{ "animation": { "loop_node": true } }"#)?;
//! assert!(settings.animation.loop_skeletal);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Playback policy shared by every animator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Skeletal animations wrap around when they reach their duration.
    pub loop_skeletal: bool,

    /// Node animations wrap around when they reach their duration.
    pub loop_node: bool,

    /// When a single tick crosses several event keyframes, fire all of them
    /// in order. When `false`, only the latest crossed event fires.
    pub replay_skipped_events: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            loop_skeletal: true,
            loop_node: false,
            replay_skipped_events: true,
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub animation: AnimationSettings,

    /// Multiplier applied to every `dt` handed to the engine.
    pub time_scale: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            animation: AnimationSettings::default(),
            time_scale: 1.0,
        }
    }
}

impl EngineSettings {
    /// Parses settings from a (possibly partial) JSON document.
    pub fn from_json(source: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(source)?;
        log::debug!("Loaded engine settings: {settings:?}");
        Ok(settings)
    }

    /// Serializes the settings as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = EngineSettings::from_json(r#"{ "animation": { "loop_node": true } }"#).unwrap();
        assert!(settings.animation.loop_node);
        assert!(settings.animation.loop_skeletal);
        assert!(settings.animation.replay_skipped_events);
        assert_eq!(settings.time_scale, 1.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(EngineSettings::from_json("{ animation: ").is_err());
    }
}

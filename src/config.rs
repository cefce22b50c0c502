//! Tunable settings for the camera, movement and ground probe.
//!
//! Settings are plain serde structs with defaults for every field, so a RON
//! file only needs to list what it overrides:
//!
//! ```ron
//! (
//!     camera: (sensitivity: 0.003, max_distance: 30.0),
//!     movement: (move_speed: 8.0),
//! )
//! ```
use std::f32::consts::FRAC_PI_2;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::controller::input::KeyBindings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}

/// How the camera closes the gap to its desired orbit position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Smoothing {
    /// Fixed lerp factor per update. Convergence speed depends on frame rate.
    FixedBlend,
    /// Exponential approach, `1 - exp(-rate * dt)` per update.
    TimeScaled { rate: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Radians per pixel of mouse movement.
    pub sensitivity: f32,
    pub min_pitch: f32,
    pub max_pitch: f32,
    pub initial_yaw: f32,
    pub initial_pitch: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub initial_distance: f32,
    pub zoom_speed: f32,
    /// Converts raw wheel units into world units before `zoom_speed`.
    pub wheel_scale: f32,
    /// Lerp factor used by [`Smoothing::FixedBlend`].
    pub blend: f32,
    pub smoothing: Smoothing,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.002,
            min_pitch: 0.1,
            max_pitch: FRAC_PI_2 - 0.1,
            initial_yaw: 0.0,
            initial_pitch: std::f32::consts::FRAC_PI_4,
            min_distance: 2.0,
            max_distance: 20.0,
            initial_distance: 10.0,
            zoom_speed: 0.5,
            wheel_scale: 0.01,
            blend: 0.1,
            smoothing: Smoothing::FixedBlend,
        }
    }
}

impl CameraConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_pitch > 0.0 && self.max_pitch < FRAC_PI_2 && self.min_pitch <= self.max_pitch) {
            return Err(invalid(
                "camera.min_pitch/max_pitch",
                format!("need 0 < {} <= {} < PI/2", self.min_pitch, self.max_pitch),
            ));
        }
        if !(self.min_distance > 0.0 && self.min_distance <= self.max_distance) {
            return Err(invalid(
                "camera.min_distance/max_distance",
                format!("need 0 < {} <= {}", self.min_distance, self.max_distance),
            ));
        }
        if !(self.blend > 0.0 && self.blend <= 1.0) {
            return Err(invalid("camera.blend", format!("{} not in (0, 1]", self.blend)));
        }
        if let Smoothing::TimeScaled { rate } = self.smoothing {
            if !(rate > 0.0 && rate.is_finite()) {
                return Err(invalid("camera.smoothing.rate", format!("{rate} must be positive")));
            }
        }
        if !self.sensitivity.is_finite() || !self.zoom_speed.is_finite() || !self.wheel_scale.is_finite() {
            return Err(invalid("camera", "sensitivity, zoom_speed and wheel_scale must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    pub move_speed: f32,
    pub jump_strength: f32,
    /// Vertical acceleration while airborne (negative is down).
    pub gravity: f32,
    /// Blend rate toward the desired horizontal velocity while airborne, per second.
    pub air_control: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            move_speed: 10.0,
            jump_strength: 20.0,
            gravity: -20.0,
            air_control: 2.0,
        }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.move_speed >= 0.0 && self.move_speed.is_finite()) {
            return Err(invalid("movement.move_speed", format!("{} must be >= 0", self.move_speed)));
        }
        if !(self.jump_strength >= 0.0 && self.jump_strength.is_finite()) {
            return Err(invalid("movement.jump_strength", format!("{} must be >= 0", self.jump_strength)));
        }
        if !self.gravity.is_finite() {
            return Err(invalid("movement.gravity", "must be finite"));
        }
        if !(self.air_control >= 0.0 && self.air_control.is_finite()) {
            return Err(invalid("movement.air_control", format!("{} must be >= 0", self.air_control)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Horizontal offset of the four corner rays from the footprint center.
    pub half_extent: f32,
    /// A ray counts as grounded when it hits closer than this.
    pub ground_threshold: f32,
    /// Length of the drawn diagnostic ray.
    pub ray_length: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            half_extent: 0.5,
            ground_threshold: 0.55,
            ray_length: 1.0,
        }
    }
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.half_extent >= 0.0 && self.half_extent.is_finite()) {
            return Err(invalid("probe.half_extent", format!("{} must be >= 0", self.half_extent)));
        }
        if !(self.ground_threshold > 0.0 && self.ground_threshold.is_finite()) {
            return Err(invalid("probe.ground_threshold", format!("{} must be > 0", self.ground_threshold)));
        }
        if !(self.ray_length > 0.0 && self.ray_length.is_finite()) {
            return Err(invalid("probe.ray_length", format!("{} must be > 0", self.ray_length)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub camera: CameraConfig,
    pub movement: MovementConfig,
    pub probe: ProbeConfig,
    pub bindings: KeyBindings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.camera.validate()?;
        self.movement.validate()?;
        self.probe.validate()
    }

    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let settings: Settings = ron::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_ron_str(&text)?;
        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Like [`Settings::load`], but logs the failure and returns defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path.as_ref()) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.as_ref().display(), "using default settings: {e}");
                Self::default()
            }
        }
    }
}

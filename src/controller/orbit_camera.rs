use glam::Vec3;
use tracing::trace;

use crate::config::{CameraConfig, Smoothing};
use crate::model::{Camera, CameraState};

/// Follow camera orbiting a moving target.
///
/// Mouse look changes yaw/pitch, the wheel changes distance, and every update
/// eases the camera toward the orbit position around the latest target before
/// looking at it.
pub struct OrbitCamera {
    config: CameraConfig,
    state: CameraState,
    camera: Camera,
}

/// Like `f32::clamp`, but an inverted or NaN range never panics. Configs are
/// expected to pass [`CameraConfig::validate`] first.
fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

impl OrbitCamera {
    pub fn new(config: CameraConfig, width: u32, height: u32) -> Self {
        let mut state = CameraState {
            yaw: config.initial_yaw,
            pitch: clamp_range(config.initial_pitch, config.min_pitch, config.max_pitch),
            distance: clamp_range(config.initial_distance, config.min_distance, config.max_distance),
            position: Vec3::ZERO,
            target: None,
        };
        // start on the orbit around the origin so the first frames have a valid view
        state.position = state.orbit_position(Vec3::ZERO);

        let mut camera = Camera::new(width, height);
        camera.eye = state.position;
        camera.look_at = Vec3::ZERO;

        Self { config, state, camera }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.camera.set_aspect(width, height);
    }

    /// Unit view direction, zero when degenerate.
    pub fn forward(&self) -> Vec3 {
        self.camera.forward()
    }

    /// Apply a mouse-look delta. Ignored unless pointer capture is engaged.
    pub fn apply_look(&mut self, dx: f32, dy: f32, pointer_locked: bool) {
        if !pointer_locked || !dx.is_finite() || !dy.is_finite() {
            return;
        }
        let sensitivity = self.config.sensitivity;
        self.state.yaw -= dx * sensitivity;
        self.state.pitch = clamp_range(self.state.pitch - dy * sensitivity, self.config.min_pitch, self.config.max_pitch);
    }

    /// Apply a wheel delta (browser convention: positive zooms out).
    pub fn apply_zoom(&mut self, delta_y: f32) {
        if !delta_y.is_finite() {
            return;
        }
        let step = delta_y * self.config.wheel_scale * self.config.zoom_speed;
        self.state.distance = clamp_range(self.state.distance + step, self.config.min_distance, self.config.max_distance);
    }

    pub fn desired_position(&self, target: Vec3) -> Vec3 {
        self.state.orbit_position(target)
    }

    fn blend_factor(&self, dt: f32) -> f32 {
        match self.config.smoothing {
            Smoothing::FixedBlend => self.config.blend,
            Smoothing::TimeScaled { rate } => {
                let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
                1.0 - (-rate * dt).exp()
            }
        }
    }

    /// Ease toward the orbit position around `target` and look at it.
    ///
    /// With no target the pose is left untouched.
    pub fn update(&mut self, target: Option<Vec3>, dt: f32) {
        let Some(target) = target.filter(|t| t.is_finite()) else {
            return;
        };

        let desired = self.desired_position(target);
        let t = self.blend_factor(dt).clamp(0.0, 1.0);
        self.state.position = self.state.position.lerp(desired, t);
        self.state.target = Some(target);

        self.camera.eye = self.state.position;
        self.camera.look_at = target;

        trace!(
            yaw = self.state.yaw,
            pitch = self.state.pitch,
            distance = self.state.distance,
            position = ?self.state.position,
            "camera update"
        );
    }
}

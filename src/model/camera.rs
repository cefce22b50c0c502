use glam::{Mat4, Vec3};

/// Orbit parameters and smoothed pose of the follow camera.
///
/// `pitch` is the polar angle measured from world up, so `pitch -> 0` looks
/// straight down on the target and `pitch -> PI/2` is level with it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub position: Vec3,
    pub target: Option<Vec3>,
}

impl CameraState {
    /// Point on the orbit sphere around `target` for the current angles.
    pub fn orbit_position(&self, target: Vec3) -> Vec3 {
        let (sin_p, cos_p) = self.pitch.sin_cos();
        let (sin_y, cos_y) = self.yaw.sin_cos();
        Vec3::new(
            target.x + self.distance * sin_p * sin_y,
            target.y + self.distance * cos_p,
            target.z + self.distance * sin_p * cos_y,
        )
    }
}

/// Render-facing camera: eye, look-at point and projection.
pub struct Camera {
    pub eye: Vec3,
    pub look_at: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::new(0.0, 5.0, 10.0),
            look_at: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 75f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.1,
            z_far: 1000.0,
        }
    }

    /// Unit view direction, or zero when eye and look-at coincide.
    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.eye).normalize_or_zero()
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn view(&self) -> Mat4 {
        let forward = self.forward();
        // look_at_rh is undefined for a zero or vertical view direction
        if forward == Vec3::ZERO || forward.cross(self.up).length_squared() < 1e-12 {
            return Mat4::from_translation(-self.eye);
        }
        Mat4::look_at_rh(self.eye, self.look_at, self.up)
    }

    pub fn view_proj(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * self.view()
    }
}

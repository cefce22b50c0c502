use glam::Vec3;
use tracing::{debug, trace};

use crate::config::{MovementConfig, Settings};
use crate::controller::diagnostics::ProbeDiagnostics;
use crate::controller::ground_probe::{GroundProbe, GroundProbeResult};
use crate::controller::input::{InputProcessor, InputState};
use crate::controller::physics::PhysicsBody;
use crate::model::{CharacterState, RayCaster};

/// Horizontal movement basis derived from the camera's view direction.
///
/// Both vectors lie in the XZ plane and are unit length, or zero when the view
/// direction has no horizontal component.
pub fn movement_basis(camera_forward: Vec3) -> (Vec3, Vec3) {
    let forward = Vec3::new(camera_forward.x, 0.0, camera_forward.z).normalize_or_zero();
    let right = forward.cross(Vec3::Y).normalize_or_zero();
    (forward, right)
}

/// Velocity to command for the next frame.
///
/// Grounded: horizontal velocity is set directly and vertical velocity is the
/// jump strength while jump is held, zero otherwise. Holding jump re-applies
/// it on every grounded frame.
///
/// Airborne: horizontal velocity eases toward the target by
/// `air_control * dt` (capped at a full step) and gravity accumulates.
pub fn next_velocity(
    current: Vec3,
    grounded: bool,
    move_dir: Vec3,
    jump: bool,
    dt: f32,
    config: &MovementConfig,
) -> Vec3 {
    let target = move_dir * config.move_speed;

    if grounded {
        let vy = if jump { config.jump_strength } else { 0.0 };
        return Vec3::new(target.x, vy, target.z);
    }

    let t = (config.air_control * dt).clamp(0.0, 1.0);
    Vec3::new(
        current.x + (target.x - current.x) * t,
        current.y + config.gravity * dt,
        current.z + (target.z - current.z) * t,
    )
}

/// Drives a physics body from held keys and the camera's orientation.
///
/// The controller reads the body's state at the top of every update, probes
/// for ground, and writes exactly one velocity back. It never sets position.
pub struct CharacterController<B: PhysicsBody> {
    body: B,
    movement: MovementConfig,
    probe: GroundProbe,
    input: InputProcessor,
    state: CharacterState,
}

impl<B: PhysicsBody> CharacterController<B> {
    pub fn new(body: B, settings: &Settings) -> Self {
        Self::with_parts(
            body,
            settings.movement.clone(),
            GroundProbe::new(settings.probe.clone()),
            InputProcessor::new(settings.bindings.clone()),
        )
    }

    pub fn with_parts(body: B, movement: MovementConfig, probe: GroundProbe, input: InputProcessor) -> Self {
        let state = CharacterState {
            position: body.position().unwrap_or(Vec3::ZERO),
            velocity: body.velocity().unwrap_or(Vec3::ZERO),
            grounded: false,
        };
        Self { body, movement, probe, input, state }
    }

    pub fn body(&self) -> &B {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    pub fn into_body(self) -> B {
        self.body
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn movement(&self) -> &MovementConfig {
        &self.movement
    }

    /// Normalized desired direction from held movement keys, or zero.
    pub fn move_direction(&self, input: &InputState, camera_forward: Vec3) -> Vec3 {
        let (forward, right) = movement_basis(camera_forward);
        let mut dir = Vec3::ZERO;

        if self.input.is_moving_forward(input) {
            dir += forward;
        }
        if self.input.is_moving_backward(input) {
            dir -= forward;
        }
        if self.input.is_moving_left(input) {
            dir -= right;
        }
        if self.input.is_moving_right(input) {
            dir += right;
        }

        dir.normalize_or_zero()
    }

    /// Run one frame: probe, compute and command velocity. Returns the
    /// commanded velocity.
    pub fn update(
        &mut self,
        input: &InputState,
        camera_forward: Vec3,
        colliders: &impl RayCaster,
        diagnostics: &mut dyn ProbeDiagnostics,
        dt: f32,
    ) -> Vec3 {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        let position = self.body.position().unwrap_or(Vec3::ZERO);
        let current = self
            .body
            .velocity()
            .filter(|v| v.is_finite())
            .unwrap_or(Vec3::ZERO);

        let GroundProbeResult { grounded, .. } =
            self.probe.probe(position, colliders, self.body.collider(), diagnostics);

        let move_dir = self.move_direction(input, camera_forward);
        let jump = self.input.is_jumping(input);
        let velocity = next_velocity(current, grounded, move_dir, jump, dt, &self.movement);

        self.body.set_velocity(velocity);
        let previous = self.state.locomotion();
        self.state = CharacterState { position, velocity, grounded };
        if self.state.locomotion() != previous {
            debug!(locomotion = ?self.state.locomotion(), ?position, "locomotion changed");
        }

        trace!(?velocity, grounded, jump, "character update");
        velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::diagnostics::NoDiagnostics;
    use crate::controller::input::InputEvent;
    use crate::model::{Locomotion, Ray, RayHit};

    /// Body whose reported state only changes when a test says so
    #[derive(Default)]
    struct MockBody {
        position: Option<Vec3>,
        velocity: Option<Vec3>,
        commands: Vec<Vec3>,
    }

    impl PhysicsBody for MockBody {
        fn position(&self) -> Option<Vec3> {
            self.position
        }
        fn velocity(&self) -> Option<Vec3> {
            self.velocity
        }
        fn set_velocity(&mut self, velocity: Vec3) {
            self.commands.push(velocity);
        }
    }

    /// Flat floor at y = 0, or nothing
    struct Floor(bool);

    impl RayCaster for Floor {
        fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Vec<RayHit> {
            let d = ray.origin.y;
            if self.0 && d >= 0.0 && d <= max_distance {
                vec![RayHit { distance: d, point: ray.at(d), collider: crate::model::ColliderId(0) }]
            } else {
                Vec::new()
            }
        }
    }

    const GROUND: Floor = Floor(true);
    const AIR: Floor = Floor(false);

    fn controller(position: Vec3, velocity: Vec3) -> CharacterController<MockBody> {
        let body = MockBody { position: Some(position), velocity: Some(velocity), commands: Vec::new() };
        CharacterController::new(body, &Settings::default())
    }

    fn holding(keys: &[&str]) -> InputState {
        let mut input = InputState::new();
        for key in keys {
            input.process_event(&InputEvent::KeyDown(key.to_string()));
        }
        input
    }

    /// View direction of a camera at yaw 0 looking down at the target
    const YAW0_FORWARD: Vec3 = Vec3::new(0.0, -0.7071, -0.7071);

    #[test]
    fn test_idle_grounded_velocity_is_zero() {
        let mut c = controller(Vec3::new(0.0, 0.5, 0.0), Vec3::new(3.0, -1.0, 2.0));
        let v = c.update(&InputState::new(), YAW0_FORWARD, &GROUND, &mut NoDiagnostics, 0.016);
        assert_eq!(v, Vec3::ZERO);
        assert!(c.state().grounded);
    }

    #[test]
    fn test_jump_while_grounded() {
        let mut c = controller(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO);
        let v = c.update(&holding(&[" "]), YAW0_FORWARD, &GROUND, &mut NoDiagnostics, 0.016);
        assert_eq!(v, Vec3::new(0.0, 20.0, 0.0));
        assert_eq!(c.body().commands, vec![v]);
    }

    #[test]
    fn test_held_jump_reapplies_every_grounded_frame() {
        let mut c = controller(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO);
        let input = holding(&[" "]);
        for _ in 0..3 {
            c.update(&input, YAW0_FORWARD, &GROUND, &mut NoDiagnostics, 0.016);
        }
        assert_eq!(c.body().commands.len(), 3);
        assert!(c.body().commands.iter().all(|v| v.y == 20.0));
    }

    #[test]
    fn test_gravity_while_airborne() {
        let mut c = controller(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, 3.0, 0.0));
        let v = c.update(&InputState::new(), YAW0_FORWARD, &AIR, &mut NoDiagnostics, 0.1);
        assert!((v.y - 1.0).abs() < 1e-6, "vy = {}", v.y);
        assert_eq!(c.state().locomotion(), Locomotion::Airborne);

        // jump has no effect in the air
        let v = c.update(&holding(&[" "]), YAW0_FORWARD, &AIR, &mut NoDiagnostics, 0.1);
        assert!((v.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_forward_at_yaw_zero_moves_at_full_speed() {
        let mut c = controller(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO);
        let v = c.update(&holding(&["w"]), YAW0_FORWARD, &GROUND, &mut NoDiagnostics, 0.016);
        assert!((c.state().horizontal_speed() - c.movement().move_speed).abs() < 1e-5);
        assert!((Vec3::new(v.x, 0.0, v.z).normalize() - Vec3::NEG_Z).length() < 1e-5);
    }

    #[test]
    fn test_diagonal_is_normalized_and_opposites_cancel() {
        let c = controller(Vec3::ZERO, Vec3::ZERO);
        let diag = c.move_direction(&holding(&["w", "d"]), YAW0_FORWARD);
        assert!((diag.length() - 1.0).abs() < 1e-6);
        assert!(diag.x > 0.0 && diag.z < 0.0);

        let none = c.move_direction(&holding(&["w", "s", "a", "d"]), YAW0_FORWARD);
        assert_eq!(none, Vec3::ZERO);
    }

    #[test]
    fn test_straight_down_camera_gives_no_movement() {
        let mut c = controller(Vec3::new(0.0, 0.5, 0.0), Vec3::ZERO);
        let v = c.update(&holding(&["w", "d"]), Vec3::NEG_Y, &GROUND, &mut NoDiagnostics, 0.016);
        assert!(v.is_finite());
        assert_eq!(v, Vec3::ZERO);
    }

    #[test]
    fn test_air_control_blends_toward_target() {
        let config = MovementConfig::default();
        let v = next_velocity(Vec3::ZERO, false, Vec3::X, false, 0.1, &config);
        // air_control 2.0 * dt 0.1 = 20% of the way to move_speed
        assert!((v.x - 0.2 * config.move_speed).abs() < 1e-5);

        let v = next_velocity(Vec3::ZERO, false, Vec3::X, false, 10.0, &config);
        assert!((v.x - config.move_speed).abs() < 1e-5);
    }

    #[test]
    fn test_uninitialised_body_is_treated_as_zero() {
        let mut c = CharacterController::new(MockBody::default(), &Settings::default());
        let v = c.update(&InputState::new(), YAW0_FORWARD, &AIR, &mut NoDiagnostics, 0.1);
        assert!((v - Vec3::new(0.0, -2.0, 0.0)).length() < 1e-6);
        assert_eq!(c.state().position, Vec3::ZERO);
    }

    #[test]
    fn test_update_is_idempotent_for_same_inputs() {
        let mut c = controller(Vec3::new(0.0, 3.0, 0.0), Vec3::new(1.0, -4.0, 0.5));
        let input = holding(&["a"]);
        let first = c.update(&input, YAW0_FORWARD, &AIR, &mut NoDiagnostics, 0.05);
        let first_state = *c.state();
        let second = c.update(&input, YAW0_FORWARD, &AIR, &mut NoDiagnostics, 0.05);
        assert_eq!(first, second);
        assert_eq!(first_state, *c.state());
    }

    #[test]
    fn test_non_finite_frame_time_is_ignored() {
        let mut c = controller(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        let v = c.update(&InputState::new(), YAW0_FORWARD, &AIR, &mut NoDiagnostics, f32::NAN);
        assert_eq!(v, Vec3::new(0.0, -1.0, 0.0));
    }
}

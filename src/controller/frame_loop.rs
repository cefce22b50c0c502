use glam::Vec3;
use tracing::debug;

use crate::config::Settings;
use crate::controller::character_controller::CharacterController;
use crate::controller::diagnostics::{NoDiagnostics, ProbeDiagnostics};
use crate::controller::input::InputState;
use crate::controller::orbit_camera::OrbitCamera;
use crate::controller::physics::PhysicsBody;
use crate::model::{CharacterState, RayCaster};

/// Result of one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    pub velocity: Vec3,
    pub character: CharacterState,
    pub camera_position: Vec3,
    pub camera_forward: Vec3,
}

/// Per-frame driver for the character and its follow camera.
///
/// Each update runs in a fixed order: take this frame's input deltas, probe
/// for ground and command a velocity, let the physics engine step, then pull
/// the body's new position and move the camera after it.
pub struct FrameLoop<B: PhysicsBody, D: ProbeDiagnostics = NoDiagnostics> {
    camera: OrbitCamera,
    character: CharacterController<B>,
    diagnostics: D,
    attached: bool,
}

impl<B: PhysicsBody> FrameLoop<B, NoDiagnostics> {
    pub fn new(body: B, settings: &Settings, width: u32, height: u32) -> Self {
        Self::with_diagnostics(body, settings, width, height, NoDiagnostics)
    }
}

impl<B: PhysicsBody, D: ProbeDiagnostics> FrameLoop<B, D> {
    pub fn with_diagnostics(body: B, settings: &Settings, width: u32, height: u32, diagnostics: D) -> Self {
        Self {
            camera: OrbitCamera::new(settings.camera.clone(), width, height),
            character: CharacterController::new(body, settings),
            diagnostics,
            attached: true,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.camera
    }

    pub fn character(&self) -> &CharacterController<B> {
        &self.character
    }

    pub fn body(&self) -> &B {
        self.character.body()
    }

    pub fn body_mut(&mut self) -> &mut B {
        self.character.body_mut()
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Stop updating and drop this frame's diagnostic artifacts.
    pub fn detach(&mut self) {
        if self.attached {
            debug!("frame loop detached");
        }
        self.attached = false;
        self.diagnostics.clear();
    }

    /// Advance one frame. `step_physics` is where the engine integrates the
    /// commanded velocity. Returns `None` once detached.
    pub fn update<R, F>(&mut self, input: &mut InputState, colliders: &mut R, dt: f32, step_physics: F) -> Option<FrameOutput>
    where
        R: RayCaster,
        F: FnOnce(&mut B, &mut R, f32),
    {
        if !self.attached {
            return None;
        }

        let (dx, dy) = input.consume_look();
        let wheel = input.consume_wheel();

        let velocity = self.character.update(
            input,
            self.camera.forward(),
            &*colliders,
            &mut self.diagnostics,
            dt,
        );

        step_physics(self.character.body_mut(), colliders, dt);

        self.camera.apply_look(dx, dy, input.pointer_locked);
        self.camera.apply_zoom(wheel);
        self.camera.update(self.character.body().position(), dt);

        Some(FrameOutput {
            velocity,
            character: *self.character.state(),
            camera_position: self.camera.state().position,
            camera_forward: self.camera.forward(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::diagnostics::DebugLines;
    use crate::controller::ground_probe::SAMPLE_COUNT;
    use crate::controller::input::InputEvent;
    use crate::controller::physics::KinematicBody;
    use crate::model::{Aabb, ColliderRegistry};

    const DT: f32 = 1.0 / 60.0;

    fn scene() -> (ColliderRegistry, KinematicBody) {
        let mut registry = ColliderRegistry::new();
        registry.insert(Aabb::new(Vec3::new(-50.0, -1.0, -50.0), Vec3::new(50.0, 0.0, 50.0)));
        let body = KinematicBody::spawn(&mut registry, Vec3::new(0.0, 3.0, 0.0), Vec3::splat(0.5));
        (registry, body)
    }

    fn step(body: &mut KinematicBody, registry: &mut ColliderRegistry, dt: f32) {
        body.step(registry, dt);
    }

    #[test]
    fn test_character_falls_lands_and_jumps() {
        let (mut registry, body) = scene();
        let mut frame = FrameLoop::new(body, &Settings::default(), 800, 600);
        let mut input = InputState::new();

        let first = frame.update(&mut input, &mut registry, DT, step).unwrap();
        assert!(!first.character.grounded);

        let mut landed = false;
        for _ in 0..300 {
            let out = frame.update(&mut input, &mut registry, DT, step).unwrap();
            if out.character.grounded {
                landed = true;
                break;
            }
        }
        assert!(landed);
        // grounded once the center is within the probe threshold of the floor
        let y = frame.body().position().unwrap().y;
        assert!(y > 0.5 - 1e-3 && y < 0.55, "landed at {y}");

        input.process_event(&InputEvent::KeyDown(" ".into()));
        let out = frame.update(&mut input, &mut registry, DT, step).unwrap();
        assert_eq!(out.velocity.y, 20.0);
        assert!(frame.body().position().unwrap().y > 0.5);
    }

    #[test]
    fn test_camera_follows_body() {
        let (mut registry, body) = scene();
        let mut frame = FrameLoop::new(body, &Settings::default(), 800, 600);
        let mut input = InputState::new();
        input.process_event(&InputEvent::KeyDown("w".into()));

        for _ in 0..240 {
            frame.update(&mut input, &mut registry, DT, step);
        }
        let target = frame.body().position().unwrap();
        assert!(target.z < -10.0, "moved to {target:?}");
        assert_eq!(frame.camera().state().target, Some(target));
        // the camera trails the character along the direction of travel
        assert!(frame.camera().state().position.z > target.z);
    }

    #[test]
    fn test_look_and_wheel_are_consumed_once() {
        let (mut registry, body) = scene();
        let mut frame = FrameLoop::new(body, &Settings::default(), 800, 600);
        let mut input = InputState::new();
        input.process_event(&InputEvent::PointerLockChanged { locked: true });
        input.process_event(&InputEvent::MouseMove { dx: 50.0, dy: 0.0 });
        input.process_event(&InputEvent::MouseWheel { delta_y: 100.0 });

        frame.update(&mut input, &mut registry, DT, step);
        let yaw = frame.camera().state().yaw;
        let distance = frame.camera().state().distance;
        assert!((yaw + 0.1).abs() < 1e-6);
        assert!((distance - 10.5).abs() < 1e-5);

        frame.update(&mut input, &mut registry, DT, step);
        assert_eq!(frame.camera().state().yaw, yaw);
        assert_eq!(frame.camera().state().distance, distance);
    }

    #[test]
    fn test_detach_stops_updates_and_clears_diagnostics() {
        let (mut registry, body) = scene();
        let mut frame = FrameLoop::with_diagnostics(body, &Settings::default(), 800, 600, DebugLines::new());
        let mut input = InputState::new();

        frame.update(&mut input, &mut registry, DT, step);
        assert_eq!(frame.diagnostics().lines().len(), SAMPLE_COUNT);

        frame.detach();
        assert!(frame.diagnostics().lines().is_empty());
        let before = frame.body().position();
        assert!(frame.update(&mut input, &mut registry, DT, step).is_none());
        assert_eq!(frame.body().position(), before);
        assert!(frame.diagnostics().lines().is_empty());
    }

    #[test]
    fn test_debug_lines_do_not_change_behaviour() {
        let (mut plain_registry, plain_body) = scene();
        let (mut debug_registry, debug_body) = scene();
        let settings = Settings::default();
        let mut plain = FrameLoop::new(plain_body, &settings, 800, 600);
        let mut debug = FrameLoop::with_diagnostics(debug_body, &settings, 800, 600, DebugLines::new());
        let mut plain_input = InputState::new();
        let mut debug_input = InputState::new();

        for i in 0..200 {
            let event = match i {
                30 => Some(InputEvent::KeyDown("w".into())),
                90 => Some(InputEvent::KeyDown(" ".into())),
                120 => Some(InputEvent::KeyUp(" ".into())),
                _ => None,
            };
            if let Some(event) = event {
                plain_input.process_event(&event);
                debug_input.process_event(&event);
            }

            let a = plain.update(&mut plain_input, &mut plain_registry, DT, step);
            let b = debug.update(&mut debug_input, &mut debug_registry, DT, step);
            assert_eq!(a, b, "frame {i}");
        }
        assert_eq!(debug.diagnostics().lines().len(), SAMPLE_COUNT);
    }
}

use glam::Vec3;

use crate::model::{Aabb, ColliderId, ColliderRegistry};

/// The character's rigid body as seen by the controller.
///
/// Position and velocity are `None` until the engine has reported them.
/// `set_velocity` is the controller's only write channel; it never moves the
/// body directly.
pub trait PhysicsBody {
    fn position(&self) -> Option<Vec3>;
    fn velocity(&self) -> Option<Vec3>;
    fn set_velocity(&mut self, velocity: Vec3);

    /// Collider the body registered for itself, excluded from ground probes.
    fn collider(&self) -> Option<ColliderId> {
        None
    }
}

/// Minimal kinematic box body moving against a [`ColliderRegistry`].
///
/// Integrates the commanded velocity each step and resolves collisions one
/// axis at a time, zeroing velocity along a blocked axis. It applies no
/// gravity of its own: the controller owns vertical velocity.
#[derive(Debug, Clone)]
pub struct KinematicBody {
    position: Vec3,
    velocity: Vec3,
    half_extents: Vec3,
    collider: ColliderId,
}

impl KinematicBody {
    /// Register a box of `half_extents` at `position` and return its body.
    pub fn spawn(registry: &mut ColliderRegistry, position: Vec3, half_extents: Vec3) -> Self {
        let collider = registry.insert(Aabb::from_center(position, half_extents));
        Self {
            position,
            velocity: Vec3::ZERO,
            half_extents,
            collider,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.half_extents)
    }

    /// Whether sweeping the box by `offset` runs into anything it doesn't
    /// already overlap.
    fn blocked(&self, registry: &ColliderRegistry, offset: Vec3) -> bool {
        let me = self.aabb();
        let moved = me.translated(offset);
        let swept = Aabb::new(me.min.min(moved.min), me.max.max(moved.max));
        registry.iter().any(|(id, other)| {
            id != self.collider && swept.intersects(other) && !me.intersects(other)
        })
    }

    /// Advance by `dt` seconds and sync the registry entry.
    pub fn step(&mut self, registry: &mut ColliderRegistry, dt: f32) {
        if !(dt > 0.0 && dt.is_finite()) {
            return;
        }

        // Vertical first so landing is resolved before sliding
        for axis in [1usize, 0, 2] {
            let delta = self.velocity[axis] * dt;
            if delta == 0.0 {
                continue;
            }
            let mut offset = Vec3::ZERO;
            offset[axis] = delta;

            if self.blocked(registry, offset) {
                self.snap_to_contact(registry, axis, delta);
                self.velocity[axis] = 0.0;
            } else {
                self.position[axis] += delta;
            }
        }

        registry.set(self.collider, self.aabb());
    }

    /// Move along `axis` until touching the nearest blocker in the direction of `delta`.
    fn snap_to_contact(&mut self, registry: &ColliderRegistry, axis: usize, delta: f32) {
        let me = self.aabb();
        let mut offset = Vec3::ZERO;
        offset[axis] = delta;
        let swept = Aabb::new(me.min.min(me.min + offset), me.max.max(me.max + offset));

        let mut allowed = delta;
        for (id, other) in registry.iter() {
            if id == self.collider || !swept.intersects(other) || me.intersects(other) {
                continue;
            }
            let gap = if delta > 0.0 {
                other.min[axis] - me.max[axis]
            } else {
                other.max[axis] - me.min[axis]
            };
            if gap.abs() < allowed.abs() {
                allowed = gap;
            }
        }
        if allowed.abs() < delta.abs() {
            self.position[axis] += allowed;
        }
    }
}

impl PhysicsBody for KinematicBody {
    fn position(&self) -> Option<Vec3> {
        Some(self.position)
    }

    fn velocity(&self) -> Option<Vec3> {
        Some(self.velocity)
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        if velocity.is_finite() {
            self.velocity = velocity;
        }
    }

    fn collider(&self) -> Option<ColliderId> {
        Some(self.collider)
    }
}

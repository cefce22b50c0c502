use glam::Vec3;

/// Local mirror of the character's physics state, refreshed every frame.
///
/// `grounded` is always the result of this frame's ground probe.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CharacterState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
}

/// Which velocity branch the controller took this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locomotion {
    Grounded,
    Airborne,
}

impl CharacterState {
    pub fn locomotion(&self) -> Locomotion {
        if self.grounded {
            Locomotion::Grounded
        } else {
            Locomotion::Airborne
        }
    }

    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.velocity.x, 0.0, self.velocity.z).length()
    }
}

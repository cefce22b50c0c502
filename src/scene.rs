//! Demo level shared by the native and browser hosts: a ground plane and a
//! few platforms to jump between.
use glam::Vec3;

use crate::model::{Aabb, ColliderId, ColliderRegistry};

/// Where the character's center starts, dropped slightly above the ground.
pub const SPAWN_POINT: Vec3 = Vec3::new(0.0, 2.0, 0.0);

const GROUND_HALF_SIZE: f32 = 50.0;

/// (center, half extents) of each platform
const PLATFORMS: [(Vec3, Vec3); 4] = [
    (Vec3::new(4.0, 0.5, -4.0), Vec3::new(1.5, 0.5, 1.5)),
    (Vec3::new(8.0, 1.5, -9.0), Vec3::new(1.5, 0.5, 1.5)),
    (Vec3::new(3.0, 2.5, -14.0), Vec3::new(2.0, 0.5, 1.0)),
    (Vec3::new(-6.0, 1.0, 2.0), Vec3::new(0.5, 1.0, 6.0)),
];

/// Register the ground plane and platforms, returning their ids.
pub fn populate(registry: &mut ColliderRegistry) -> Vec<ColliderId> {
    let mut ids = vec![registry.insert(Aabb::new(
        Vec3::new(-GROUND_HALF_SIZE, -1.0, -GROUND_HALF_SIZE),
        Vec3::new(GROUND_HALF_SIZE, 0.0, GROUND_HALF_SIZE),
    ))];
    ids.extend(
        PLATFORMS
            .iter()
            .map(|(center, half)| registry.insert(Aabb::from_center(*center, *half))),
    );
    ids
}

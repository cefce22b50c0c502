// MODEL: camera, character and collider data
pub mod camera;
pub mod character;
pub mod collider;

pub use camera::{Camera, CameraState};
pub use character::{CharacterState, Locomotion};
pub use collider::{Aabb, ColliderId, ColliderRegistry, Ray, RayCaster, RayHit};

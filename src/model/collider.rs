use glam::Vec3;

/// Stable handle for a collider registered in a [`ColliderRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColliderId(pub u32);

/// Axis-aligned box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min: min.min(max), max: min.max(max) }
    }

    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self { min: center - half, max: center + half }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self { min: self.min + offset, max: self.max + offset }
    }

    /// Strict overlap; boxes that only share a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x
            && self.min.y < other.max.y && self.max.y > other.min.y
            && self.min.z < other.max.z && self.max.z > other.min.z
    }

    /// Slab test. Returns the entry distance along `ray`, or 0.0 when the
    /// origin is already inside the box.
    pub fn ray_distance(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if dir.abs() < f32::EPSILON {
                if origin < lo || origin > hi {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut t0 = (lo - origin) * inv;
            let mut t1 = (hi - origin) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }

        Some(t_min)
    }
}

/// Half-line starting at `origin`. `dir` is normalized on construction so hit
/// distances are in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir: dir.normalize_or_zero() }
    }

    pub fn down(origin: Vec3) -> Self {
        Self { origin, dir: Vec3::NEG_Y }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.dir * distance
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub collider: ColliderId,
}

/// Ray-intersection query against a set of collidable objects.
///
/// Implementations return every hit within `max_distance`, ordered nearest
/// first. Callers filter out their own collider.
pub trait RayCaster {
    fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Vec<RayHit>;
}

/// Explicit list of static colliders the character can stand on or bump into.
#[derive(Debug, Default, Clone)]
pub struct ColliderRegistry {
    entries: Vec<(ColliderId, Aabb)>,
    next_id: u32,
}

impl ColliderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, aabb: Aabb) -> ColliderId {
        let id = ColliderId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, aabb));
        id
    }

    pub fn remove(&mut self, id: ColliderId) -> Option<Aabb> {
        let idx = self.entries.iter().position(|(i, _)| *i == id)?;
        Some(self.entries.swap_remove(idx).1)
    }

    pub fn get(&self, id: ColliderId) -> Option<&Aabb> {
        self.entries.iter().find(|(i, _)| *i == id).map(|(_, a)| a)
    }

    pub fn set(&mut self, id: ColliderId, aabb: Aabb) -> bool {
        match self.entries.iter_mut().find(|(i, _)| *i == id) {
            Some(entry) => {
                entry.1 = aabb;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColliderId, &Aabb)> {
        self.entries.iter().map(|(id, aabb)| (*id, aabb))
    }
}

impl RayCaster for ColliderRegistry {
    fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Vec<RayHit> {
        if ray.dir == Vec3::ZERO {
            return Vec::new();
        }

        let mut hits: Vec<RayHit> = self
            .entries
            .iter()
            .filter_map(|(id, aabb)| {
                let distance = aabb.ray_distance(ray)?;
                (distance <= max_distance).then(|| RayHit {
                    distance,
                    point: ray.at(distance),
                    collider: *id,
                })
            })
            .collect();

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

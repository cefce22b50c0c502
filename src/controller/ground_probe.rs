use glam::Vec3;

use crate::config::ProbeConfig;
use crate::controller::diagnostics::ProbeDiagnostics;
use crate::model::{ColliderId, Ray, RayCaster};

pub const SAMPLE_COUNT: usize = 5;

/// One downward ray of the probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeSample {
    pub origin: Vec3,
    /// Nearest admissible hit, if any was found within the threshold.
    pub hit_distance: Option<f32>,
}

impl ProbeSample {
    pub fn is_grounded(&self, threshold: f32) -> bool {
        self.hit_distance.is_some_and(|d| d < threshold)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundProbeResult {
    pub grounded: bool,
    pub samples: [ProbeSample; SAMPLE_COUNT],
}

/// Casts five rays straight down from the character footprint (center and
/// four corners) and reports whether any of them lands on geometry closer
/// than the ground threshold.
///
/// Stateless: every call re-evaluates from scratch.
#[derive(Debug, Clone, Default)]
pub struct GroundProbe {
    config: ProbeConfig,
}

impl GroundProbe {
    pub fn new(config: ProbeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Ray origins for a body centered at `position`.
    pub fn sample_origins(&self, position: Vec3) -> [Vec3; SAMPLE_COUNT] {
        let h = self.config.half_extent;
        [
            position,
            position + Vec3::new(h, 0.0, h),
            position + Vec3::new(h, 0.0, -h),
            position + Vec3::new(-h, 0.0, h),
            position + Vec3::new(-h, 0.0, -h),
        ]
    }

    /// Probe below `position`, ignoring hits on `exclude` (the character's
    /// own collider).
    pub fn probe(
        &self,
        position: Vec3,
        colliders: &impl RayCaster,
        exclude: Option<ColliderId>,
        diagnostics: &mut dyn ProbeDiagnostics,
    ) -> GroundProbeResult {
        let threshold = self.config.ground_threshold;
        diagnostics.clear();

        let samples = self.sample_origins(position).map(|origin| {
            let ray = Ray::down(origin);
            let hit_distance = colliders
                .cast_ray(&ray, threshold)
                .into_iter()
                .find(|hit| Some(hit.collider) != exclude && hit.distance.is_finite())
                .map(|hit| hit.distance);

            let sample = ProbeSample { origin, hit_distance };
            diagnostics.add_line(origin, ray.at(self.config.ray_length), sample.is_grounded(threshold));
            sample
        });

        GroundProbeResult {
            grounded: samples.iter().any(|s| s.is_grounded(threshold)),
            samples,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::diagnostics::{DebugLines, NoDiagnostics};
    use crate::model::{Aabb, ColliderRegistry, RayHit};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers rays by origin, returning canned hits
    #[derive(Default)]
    struct MockCaster {
        hits: HashMap<(i32, i32), Vec<RayHit>>,
        calls: RefCell<usize>,
    }

    impl MockCaster {
        fn key(origin: Vec3) -> (i32, i32) {
            ((origin.x * 10.0).round() as i32, (origin.z * 10.0).round() as i32)
        }

        fn with_hit(mut self, origin: Vec3, distance: f32, collider: u32) -> Self {
            self.hits.entry(Self::key(origin)).or_default().push(RayHit {
                distance,
                point: origin - Vec3::Y * distance,
                collider: ColliderId(collider),
            });
            self
        }
    }

    impl RayCaster for MockCaster {
        fn cast_ray(&self, ray: &Ray, max_distance: f32) -> Vec<RayHit> {
            *self.calls.borrow_mut() += 1;
            self.hits
                .get(&Self::key(ray.origin))
                .map(|hits| hits.iter().copied().filter(|h| h.distance <= max_distance).collect())
                .unwrap_or_default()
        }
    }

    #[test]
    fn test_single_corner_hit_is_grounded() {
        let probe = GroundProbe::default();
        let corner = Vec3::new(-0.5, 1.0, 0.5);
        let caster = MockCaster::default().with_hit(corner, 0.3, 1);

        let result = probe.probe(Vec3::new(0.0, 1.0, 0.0), &caster, None, &mut NoDiagnostics);
        assert!(result.grounded);
        assert_eq!(result.samples.iter().filter(|s| s.hit_distance.is_some()).count(), 1);
        assert_eq!(*caster.calls.borrow(), SAMPLE_COUNT);
    }

    #[test]
    fn test_no_hits_or_far_hits_are_airborne() {
        let probe = GroundProbe::default();
        let position = Vec3::new(0.0, 1.0, 0.0);

        let empty = MockCaster::default();
        assert!(!probe.probe(position, &empty, None, &mut NoDiagnostics).grounded);

        let far = probe
            .sample_origins(position)
            .into_iter()
            .fold(MockCaster::default(), |caster, origin| caster.with_hit(origin, 0.8, 1));
        assert!(!probe.probe(position, &far, None, &mut NoDiagnostics).grounded);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let probe = GroundProbe::default();
        let caster = MockCaster::default().with_hit(Vec3::ZERO, 0.55, 1);
        assert!(!probe.probe(Vec3::ZERO, &caster, None, &mut NoDiagnostics).grounded);
    }

    #[test]
    fn test_own_collider_is_ignored() {
        let probe = GroundProbe::default();
        let caster = MockCaster::default().with_hit(Vec3::ZERO, 0.0, 7);
        let result = probe.probe(Vec3::ZERO, &caster, Some(ColliderId(7)), &mut NoDiagnostics);
        assert!(!result.grounded);

        // the hit behind our own collider still counts
        let caster = MockCaster::default()
            .with_hit(Vec3::ZERO, 0.0, 7)
            .with_hit(Vec3::ZERO, 0.5, 2);
        assert!(probe.probe(Vec3::ZERO, &caster, Some(ColliderId(7)), &mut NoDiagnostics).grounded);
    }

    #[test]
    fn test_unit_cube_resting_on_ground_plane() {
        let mut registry = ColliderRegistry::new();
        registry.insert(Aabb::new(Vec3::new(-50.0, -1.0, -50.0), Vec3::new(50.0, 0.0, 50.0)));
        let body = registry.insert(Aabb::from_center(Vec3::new(0.0, 0.5, 0.0), Vec3::splat(0.5)));
        let probe = GroundProbe::default();

        let resting = probe.probe(Vec3::new(0.0, 0.5, 0.0), &registry, Some(body), &mut NoDiagnostics);
        assert!(resting.grounded);

        let lifted = probe.probe(Vec3::new(0.0, 1.5, 0.0), &registry, Some(body), &mut NoDiagnostics);
        assert!(!lifted.grounded);
    }

    #[test]
    fn test_edge_of_platform_uses_corner_ray() {
        let mut registry = ColliderRegistry::new();
        // platform covering only x >= 0.3
        registry.insert(Aabb::new(Vec3::new(0.3, -1.0, -5.0), Vec3::new(5.0, 0.0, 5.0)));
        let probe = GroundProbe::default();
        let result = probe.probe(Vec3::new(0.0, 0.5, 0.0), &registry, None, &mut NoDiagnostics);
        assert!(result.grounded);
        assert!(result.samples[0].hit_distance.is_none());
    }

    #[test]
    fn test_diagnostics_do_not_accumulate() {
        let probe = GroundProbe::default();
        let caster = MockCaster::default().with_hit(Vec3::ZERO, 0.2, 1);
        let mut lines = DebugLines::new();

        for _ in 0..3 {
            probe.probe(Vec3::ZERO, &caster, None, &mut lines);
        }
        assert_eq!(lines.lines().len(), SAMPLE_COUNT);
        assert_eq!(lines.lines().iter().filter(|l| l.hit).count(), 1);
        assert!((lines.lines()[0].to - Vec3::new(0.0, -1.0, 0.0)).length() < 1e-6);
    }
}

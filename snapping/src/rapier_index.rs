//! Rapier-backed anchor index.
//!
//! Builds an in-memory Rapier scene with one tiny ball collider per anchor and answers
//! "anchors within `radius` of `point`" through a borrowed `QueryPipeline`, the same way the
//! physics engine's overlap-sphere query would.
//!
//! Design goals
//! - Deterministic: samples are sorted by key before insertion.
//! - Query-focused: no dynamics are stepped; only the broad phase is built.
//! - Rebuilt wholesale between ticks (after a snap is baked). Anchors of the body being
//!   dragged may be stale in here, which is fine: a body never matches its own anchors.

// Re-export Rapier so downstream crates can build filters/shapes without depending on
// `rapier3d` directly.
pub use rapier3d;

use std::collections::HashMap;

use log::{debug, warn};
use nalgebra::Isometry3;
use rapier3d::{
    parry::shape::Ball,
    prelude::{
        BroadPhaseBvh, ColliderBuilder, ColliderHandle, ColliderSet, IntegrationParameters,
        NarrowPhase, QueryFilter, QueryPipeline, RigidBodySet,
    },
};

use crate::{
    anchor::AnchorSample,
    anchor_key::AnchorKey,
    settings::ANCHOR_PROBE_RADIUS,
    spatial::{SpatialIndex, within_radius},
    types::Point3,
};

/// In-memory Rapier structures needed for overlap queries against anchor colliders.
///
/// This stores:
/// - `RigidBodySet`/`ColliderSet` with one parentless collider per anchor.
/// - `NarrowPhase` and `BroadPhaseBvh` used to create a borrowed `QueryPipeline`.
/// - The anchor samples keyed by [`AnchorKey`], which is also packed into each collider's
///   `user_data`.
pub struct RapierAnchorIndex {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    samples: HashMap<AnchorKey, AnchorSample>,
}

impl Default for RapierAnchorIndex {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl RapierAnchorIndex {
    /// Build an index over the given anchor samples.
    ///
    /// Determinism
    /// - The input is sorted by key before insertion.
    /// - Samples with non-finite positions should be rejected by the caller (anchors
    ///   validate this at construction).
    pub fn build(mut samples: Vec<AnchorSample>) -> Self {
        samples.sort_by_key(|s| s.key);
        samples.dedup_by_key(|s| s.key);

        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut modified_colliders: Vec<ColliderHandle> = Vec::with_capacity(samples.len());

        for sample in &samples {
            let mut collider = ColliderBuilder::ball(ANCHOR_PROBE_RADIUS)
                .user_data(sample.key.raw())
                .build();
            collider.set_position(Isometry3::translation(
                sample.position.x,
                sample.position.y,
                sample.position.z,
            ));
            modified_colliders.push(colliders.insert(collider));
        }

        // Only the broad phase is needed for overlap queries; no pipeline step.
        let mut broad_phase = BroadPhaseBvh::new();
        let mut events = Vec::new();
        broad_phase.update(
            &IntegrationParameters::default(),
            &colliders,
            &bodies,
            &modified_colliders,
            &[],
            &mut events,
        );

        debug!("built rapier anchor index with {} anchor(s)", samples.len());

        Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase: NarrowPhase::default(),
            samples: samples.into_iter().map(|s| (s.key, s)).collect(),
        }
    }

    /// Create a borrowed `QueryPipeline` view over the anchor colliders.
    ///
    /// The returned pipeline borrows `self`, so it should be used within the scope of the
    /// borrow.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Resolve a collider's `user_data` back to the anchor it stands for.
    fn sample_for(&self, user_data: u128) -> Option<&AnchorSample> {
        match AnchorKey::from_raw(user_data) {
            Ok(key) => self.samples.get(&key),
            Err(e) => {
                warn!("ignoring collider with foreign user_data {user_data:#x}: {e}");
                None
            }
        }
    }
}

impl SpatialIndex for RapierAnchorIndex {
    fn query_anchors_near(&self, point: &Point3, radius: f32) -> Vec<AnchorSample> {
        if radius.is_nan() || radius < 0.0 || self.samples.is_empty() {
            return Vec::new();
        }

        let pipeline = self.query_pipeline(QueryFilter::default());
        let probe = Ball::new(radius);
        let probe_pos = Isometry3::translation(point.x, point.y, point.z);

        // The broad phase over-approximates by the collider radius; the exact center
        // distance decides membership.
        pipeline
            .intersect_shape(probe_pos, &probe)
            .filter_map(|(_, collider)| self.sample_for(collider.user_data))
            .filter(|s| within_radius(s, point, radius))
            .copied()
            .collect()
    }

    fn rebuild(&mut self, samples: Vec<AnchorSample>) {
        *self = Self::build(samples);
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        spatial::LinearAnchorIndex,
        types::{UnitVec3, Vec3},
    };

    fn grid_samples() -> Vec<AnchorSample> {
        let mut out = Vec::new();
        for i in 0..5u32 {
            for j in 0..5u32 {
                out.push(AnchorSample {
                    key: AnchorKey::pack(u64::from(i), j),
                    position: Point3::new(i as f32 * 0.4, 0.0, j as f32 * 0.4),
                    normal: UnitVec3::new_normalize(Vec3::y()),
                });
            }
        }
        out
    }

    fn sorted_keys(mut found: Vec<AnchorSample>) -> Vec<AnchorKey> {
        found.sort_by_key(|s| s.key);
        found.into_iter().map(|s| s.key).collect()
    }

    #[test]
    fn agrees_with_linear_scan() {
        let rapier = RapierAnchorIndex::build(grid_samples());
        let linear = LinearAnchorIndex::from_samples(grid_samples());

        let probes = [
            (Point3::new(0.0, 0.0, 0.0), 0.5),
            (Point3::new(0.8, 0.0, 0.8), 0.41),
            (Point3::new(0.8, 0.3, 0.8), 0.2),
            (Point3::new(5.0, 0.0, 5.0), 1.0),
            (Point3::new(0.4, 0.0, 0.4), 0.0),
        ];

        for (point, radius) in probes {
            assert_eq!(
                sorted_keys(rapier.query_anchors_near(&point, radius)),
                sorted_keys(linear.query_anchors_near(&point, radius)),
                "probe at {point:?} r={radius}"
            );
        }
    }

    #[test]
    fn user_data_round_trips_to_samples() {
        let rapier = RapierAnchorIndex::build(grid_samples());

        let found = rapier.query_anchors_near(&Point3::new(1.2, 0.0, 0.4), 0.01);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, AnchorKey::pack(3, 1));
        assert!((found[0].position - Point3::new(1.2, 0.0, 0.4)).norm() < 1.0e-6);
    }

    #[test]
    fn rebuild_moves_anchors() {
        let mut rapier = RapierAnchorIndex::build(grid_samples());
        assert_eq!(rapier.len(), 25);

        let moved = AnchorSample {
            key: AnchorKey::pack(99, 0),
            position: Point3::new(10.0, 0.0, 0.0),
            normal: UnitVec3::new_normalize(Vec3::x()),
        };
        rapier.rebuild(vec![moved]);

        assert_eq!(rapier.len(), 1);
        assert!(rapier.query_anchors_near(&Point3::origin(), 1.0).is_empty());
        assert_eq!(
            rapier.query_anchors_near(&Point3::new(10.0, 0.0, 0.1), 0.2)[0].key,
            moved.key
        );
    }

    #[test]
    fn empty_index_and_negative_radius_yield_nothing() {
        let empty = RapierAnchorIndex::default();
        assert!(empty.is_empty());
        assert!(empty.query_anchors_near(&Point3::origin(), 3.0).is_empty());

        let rapier = RapierAnchorIndex::build(grid_samples());
        assert!(rapier.query_anchors_near(&Point3::origin(), -1.0).is_empty());
    }
}

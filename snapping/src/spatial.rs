//! Spatial index seam: "which anchors lie within `radius` of a point?"
//!
//! The matcher never talks to a physics engine directly. It queries a [`SpatialIndex`], which
//! may be a plain linear scan ([`LinearAnchorIndex`]) or a physics broad phase
//! ([`crate::rapier_index::RapierAnchorIndex`]).
//!
//! Contract
//! - Queries are read-only and may return anchors in any order.
//! - An empty result is a normal outcome.
//! - Membership is decided on the exact center distance: `|p - point| <= radius`.
//! - The indexed set is replaced wholesale with [`SpatialIndex::rebuild`] between ticks, never
//!   during one.

use crate::{anchor::AnchorSample, types::Point3};

pub trait SpatialIndex {
    /// All indexed anchors whose world position lies within `radius` of `point`.
    fn query_anchors_near(&self, point: &Point3, radius: f32) -> Vec<AnchorSample>;

    /// Replace the indexed anchors.
    fn rebuild(&mut self, samples: Vec<AnchorSample>);

    /// Number of indexed anchors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exact-distance test shared by every index implementation.
#[inline]
pub(crate) fn within_radius(sample: &AnchorSample, point: &Point3, radius: f32) -> bool {
    radius >= 0.0 && (sample.position - point).norm_squared() <= radius * radius
}

/// Linear-scan index. Adequate for small scenes and used as the reference behavior for
/// the broad-phase backed index.
#[derive(Clone, Debug, Default)]
pub struct LinearAnchorIndex {
    samples: Vec<AnchorSample>,
}

impl LinearAnchorIndex {
    pub fn from_samples(samples: Vec<AnchorSample>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[AnchorSample] {
        &self.samples
    }
}

impl SpatialIndex for LinearAnchorIndex {
    fn query_anchors_near(&self, point: &Point3, radius: f32) -> Vec<AnchorSample> {
        self.samples
            .iter()
            .filter(|s| within_radius(s, point, radius))
            .copied()
            .collect()
    }

    fn rebuild(&mut self, samples: Vec<AnchorSample>) {
        self.samples = samples;
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

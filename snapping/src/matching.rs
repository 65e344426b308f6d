//! Candidate pairings between an own anchor and a foreign one.

use std::cmp::Ordering;
use std::fmt;

use crate::{
    anchor::AnchorSample,
    types::{Point3, Pose, Quat, UnitVec3, Vec3, rotation_onto},
};

/// An immutable candidate pairing of two anchors on different bodies, evaluated at one
/// instant. Recreated on every search; never cached across ticks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnappingMatch {
    own: AnchorSample,
    other: AnchorSample,
    distance: f32,
}

impl SnappingMatch {
    /// Pair `own` with `other`, measuring their live distance.
    pub fn new(own: AnchorSample, other: AnchorSample) -> Self {
        let distance = (other.position - own.position).norm();
        Self {
            own,
            other,
            distance,
        }
    }

    #[inline]
    pub fn own(&self) -> &AnchorSample {
        &self.own
    }

    #[inline]
    pub fn other(&self) -> &AnchorSample {
        &self.other
    }

    /// Euclidean distance between the two anchors at evaluation time (meters).
    #[inline]
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// The world-space vector the own anchor needs to move to reach the other anchor.
    #[inline]
    pub fn movement_vector(&self) -> Vec3 {
        self.other.position - self.own.position
    }

    /// Rotation that turns the own normal onto the reverse of the other normal, so the two
    /// anchors end up facing each other.
    pub fn rotation(&self) -> Quat {
        let target = UnitVec3::new_unchecked(-self.other.normal.into_inner());
        rotation_onto(&self.own.normal, &target)
    }

    /// Pivot for the rotation: the foreign anchor's world position.
    #[inline]
    pub fn pivot(&self) -> Point3 {
        self.other.position
    }

    /// The pose `target` takes when this match is applied: translate by
    /// [`movement_vector`](Self::movement_vector) in world space, then rotate about
    /// [`pivot`](Self::pivot) by [`rotation`](Self::rotation).
    pub fn apply_to(&self, target: &Pose) -> Pose {
        let mut aligned = *target;
        aligned.translate(&self.movement_vector());
        aligned.rotate_about(&self.pivot(), &self.rotation());
        aligned
    }

    /// Same pairing with the own anchor re-sampled (e.g. after the body moved since the
    /// match was found). The foreign anchor is kept as is.
    pub fn with_own(&self, own: AnchorSample) -> Self {
        debug_assert_eq!(own.key, self.own.key);
        Self::new(own, self.other)
    }

    /// Search priority: nearest first, then lowest `(own key, other key)` so equal
    /// distances resolve the same way whatever order the index returned them in.
    pub fn priority_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.own.key.cmp(&other.own.key))
            .then_with(|| self.other.key.cmp(&other.other.key))
    }
}

impl fmt::Display for SnappingMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} -> {:?} (distance {:.4})",
            self.own.key, self.other.key, self.distance
        )
    }
}

/// The best candidate among `candidates`, or `None` when there are none.
pub fn best_match<I>(candidates: I) -> Option<SnappingMatch>
where
    I: IntoIterator<Item = SnappingMatch>,
{
    candidates.into_iter().min_by(|a, b| a.priority_cmp(b))
}

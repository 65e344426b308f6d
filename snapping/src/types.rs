/*!
Core math aliases and the rigid `Pose` type shared by every snapping module.

This module intentionally contains no search logic. It defines the geometry exchanged between:
- anchors (world position / normal derived from the owning body's pose)
- matches (translation + rotation needed to align two anchors)
- bodies and their preview surrogate (outer pose vs. local offset)
- spatial indices (Rapier colliders are placed from these isometries)
*/

use std::f32::consts::PI;

use nalgebra as na;

use crate::settings::DIST_EPS;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type UnitVec3 = na::Unit<na::Vector3<f32>>;
pub type Iso = na::Isometry3<f32>;

/// A rigid transform (isometry) in world space, or relative to a parent when used as a
/// local offset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }

    /// Convert to nalgebra `Isometry3` for composition and for placing Rapier colliders.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }

    #[inline]
    pub fn from_iso(iso: &Iso) -> Self {
        Self::new(iso.translation.vector, iso.rotation)
    }

    /// Map a point from this pose's local space to world space.
    #[inline]
    pub fn transform_point(&self, local: &Point3) -> Point3 {
        Point3::from(self.rotation * local.coords + self.translation)
    }

    /// Rotate a local direction into world space and renormalize it.
    #[inline]
    pub fn transform_direction(&self, local: &UnitVec3) -> UnitVec3 {
        UnitVec3::new_normalize(self.rotation * local.into_inner())
    }

    /// Translate by `delta` in world space (rotation untouched).
    #[inline]
    pub fn translate(&mut self, delta: &Vec3) {
        self.translation += delta;
    }

    /// Rotate this pose about a world-space `pivot`:
    /// - translation = rot * (translation - pivot) + pivot
    /// - rotation = rot * rotation
    ///
    /// Both parts must be applied together, otherwise the pivot drifts.
    #[inline]
    pub fn rotate_about(&mut self, pivot: &Point3, rot: &Quat) {
        self.translation = rot * (self.translation - pivot.coords) + pivot.coords;
        self.rotation = rot * self.rotation;
    }

    /// `self * local`: place a child pose given in this pose's local space.
    #[inline]
    pub fn compose(&self, local: &Pose) -> Pose {
        Pose::from_iso(&(self.iso() * local.iso()))
    }

    #[inline]
    pub fn inverse(&self) -> Pose {
        Pose::from_iso(&self.iso().inverse())
    }

    /// Express this world pose relative to `parent` (i.e. `parent⁻¹ * self`).
    #[inline]
    pub fn relative_to(&self, parent: &Pose) -> Pose {
        parent.inverse().compose(self)
    }

    /// Compare translation (meters) and rotation (radians) within `eps`.
    pub fn approx_eq(&self, other: &Pose, eps: f32) -> bool {
        (self.translation - other.translation).norm() <= eps
            && self.rotation.angle_to(&other.rotation) <= eps
    }

    #[inline]
    pub fn is_identity(&self, eps: f32) -> bool {
        self.approx_eq(&Pose::identity(), eps)
    }
}

/// Shortest rotation taking direction `from` onto direction `to`.
///
/// When the directions are opposite the shortest arc is not unique; a half turn about an
/// axis orthogonal to `from` is used so the result is still deterministic.
pub fn rotation_onto(from: &UnitVec3, to: &UnitVec3) -> Quat {
    Quat::rotation_between_axis(from, to).unwrap_or_else(|| {
        let axis = orthogonal_axis(from);
        Quat::from_axis_angle(&axis, PI)
    })
}

/// Any unit axis orthogonal to `v`.
fn orthogonal_axis(v: &UnitVec3) -> UnitVec3 {
    let helper = if v.x.abs() < 0.9 {
        Vec3::x()
    } else {
        Vec3::y()
    };
    UnitVec3::new_normalize(v.cross(&helper))
}

/// Normalize an authored direction, rejecting zero-length or non-finite input.
#[inline]
pub fn try_unit(v: &Vec3) -> Option<UnitVec3> {
    if !v.iter().all(|c| c.is_finite()) {
        return None;
    }
    UnitVec3::try_new(*v, DIST_EPS)
}

//! Anchors: directional snap points attached to a rigid body.
//!
//! An anchor stores only authored, body-local data. Its world position and normal are pure
//! functions of the owning body's pose, so they are never cached across ticks.

use log::trace;

use crate::{
    anchor_key::{AnchorIndex, AnchorKey, BodyId},
    error::{Result, SnapError},
    settings::{ANGLE_EPS_DEG, DEFAULT_SNAPPING_RADIUS, SnapSettings},
    spatial::SpatialIndex,
    types::{Point3, Pose, UnitVec3, Vec3, try_unit},
};

/// Authored anchor parameters, as they come from scene data.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorDef {
    /// Offset from the body origin, in body-local space (meters).
    pub local_position: Vec3,
    /// Facing direction in body-local space. Need not be unit length, but must be non-zero.
    pub local_normal: Vec3,
    /// Search radius around the anchor's world position (meters, >= 0).
    pub radius: f32,
}

impl AnchorDef {
    /// Anchor at `local_position` facing `local_normal` with the default radius.
    pub fn new(local_position: Vec3, local_normal: Vec3) -> Self {
        Self {
            local_position,
            local_normal,
            radius: DEFAULT_SNAPPING_RADIUS,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }
}

/// World-space snapshot of an anchor, taken at query time.
///
/// This is what spatial indices store and return: an anchor's identity plus the geometry
/// the matcher needs, without borrowing the owning body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorSample {
    pub key: AnchorKey,
    pub position: Point3,
    pub normal: UnitVec3,
}

/// A validated anchor owned by exactly one body.
#[derive(Clone, Debug)]
pub struct Anchor {
    key: AnchorKey,
    local_position: Point3,
    local_normal: UnitVec3,
    radius: f32,
}

impl Anchor {
    /// Validate an authored anchor for `body`.
    ///
    /// Errors
    /// - zero-length / non-finite normal: normalizing it would produce NaN.
    /// - negative / non-finite radius.
    /// - non-finite local position.
    pub fn from_def(body: BodyId, index: AnchorIndex, def: &AnchorDef) -> Result<Self> {
        let local_normal =
            try_unit(&def.local_normal).ok_or(SnapError::ZeroNormal { body, index })?;

        if !def.radius.is_finite() || def.radius < 0.0 {
            return Err(SnapError::InvalidRadius {
                body,
                index,
                radius: def.radius,
            });
        }

        if !def.local_position.iter().all(|c| c.is_finite()) {
            return Err(SnapError::InvalidPosition { body, index });
        }

        Ok(Self {
            key: AnchorKey::pack(body, index),
            local_position: Point3::from(def.local_position),
            local_normal,
            radius: def.radius,
        })
    }

    #[inline]
    pub fn key(&self) -> AnchorKey {
        self.key
    }

    #[inline]
    pub fn owner(&self) -> BodyId {
        self.key.body()
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    #[inline]
    pub fn local_normal(&self) -> UnitVec3 {
        self.local_normal
    }

    /// World position given the owner's pose.
    #[inline]
    pub fn world_position(&self, owner_pose: &Pose) -> Point3 {
        owner_pose.transform_point(&self.local_position)
    }

    /// World normal given the owner's pose (rotated, then renormalized).
    #[inline]
    pub fn world_normal(&self, owner_pose: &Pose) -> UnitVec3 {
        owner_pose.transform_direction(&self.local_normal)
    }

    #[inline]
    pub fn sample(&self, owner_pose: &Pose) -> AnchorSample {
        AnchorSample {
            key: self.key,
            position: self.world_position(owner_pose),
            normal: self.world_normal(owner_pose),
        }
    }

    /// Other anchors in range of this one that it could snap to.
    ///
    /// - Queries `index` for anchors within `radius` of this anchor's world position.
    /// - Drops every anchor owned by the same body.
    /// - Keeps only anchors whose normal faces this one within the configured tolerance.
    ///
    /// Result order is whatever the index produced.
    pub fn find_compatible_neighbors<I>(
        &self,
        owner_pose: &Pose,
        index: &I,
        settings: &SnapSettings,
    ) -> Vec<AnchorSample>
    where
        I: SpatialIndex + ?Sized,
    {
        let own = self.sample(owner_pose);
        let neighbors: Vec<AnchorSample> = index
            .query_anchors_near(&own.position, self.radius)
            .into_iter()
            .filter(|other| other.key.body() != self.owner())
            .filter(|other| normals_compatible(&own.normal, &other.normal, settings))
            .collect();

        if !neighbors.is_empty() {
            trace!(
                "anchor {:?}: {} compatible anchor(s) in range",
                self.key,
                neighbors.len()
            );
        }

        neighbors
    }
}

/// Angle between two unit normals in degrees, in `[0, 180]`.
#[inline]
pub fn normal_angle_deg(a: &UnitVec3, b: &UnitVec3) -> f32 {
    a.into_inner().angle(&b.into_inner()).to_degrees()
}

/// Whether two normals face each other closely enough to snap.
///
/// Compatible iff `angle > 180 - tolerance` (the boundary itself counts, up to
/// [`ANGLE_EPS_DEG`]). Snapping aligns anchors with opposing normals, so near-parallel
/// normals are rejected.
#[inline]
pub fn normals_compatible(a: &UnitVec3, b: &UnitVec3, settings: &SnapSettings) -> bool {
    normal_angle_deg(a, b) + ANGLE_EPS_DEG > settings.min_facing_angle_deg()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::LinearAnchorIndex;
    use crate::types::Quat;

    /// Unit normal in the XZ plane at `deg` degrees away from +X.
    fn normal_at(deg: f32) -> UnitVec3 {
        let r = deg.to_radians();
        UnitVec3::new_normalize(Vec3::new(r.cos(), 0.0, r.sin()))
    }

    fn sample(body: BodyId, index: AnchorIndex, pos: Vec3, normal: UnitVec3) -> AnchorSample {
        AnchorSample {
            key: AnchorKey::pack(body, index),
            position: Point3::from(pos),
            normal,
        }
    }

    #[test]
    fn angle_threshold_with_default_tolerance() {
        let settings = SnapSettings::default();
        let own = normal_at(0.0);

        assert!(normals_compatible(&own, &normal_at(180.0), &settings));
        assert!(normals_compatible(&own, &normal_at(179.0), &settings));
        assert!(normals_compatible(&own, &normal_at(60.0), &settings));
        assert!(!normals_compatible(&own, &normal_at(59.9), &settings));
        assert!(!normals_compatible(&own, &normal_at(0.0), &settings));
    }

    #[test]
    fn angle_threshold_follows_configured_tolerance() {
        let strict = SnapSettings::new(10.0).unwrap();
        let own = normal_at(0.0);

        assert!(normals_compatible(&own, &normal_at(175.0), &strict));
        assert!(!normals_compatible(&own, &normal_at(160.0), &strict));
    }

    #[test]
    fn from_def_rejects_zero_normal() {
        let def = AnchorDef::new(Vec3::zeros(), Vec3::zeros());
        assert_eq!(
            Anchor::from_def(7, 2, &def).unwrap_err(),
            SnapError::ZeroNormal { body: 7, index: 2 }
        );
    }

    #[test]
    fn from_def_rejects_negative_radius() {
        let def = AnchorDef::new(Vec3::zeros(), Vec3::x()).with_radius(-0.1);
        assert!(matches!(
            Anchor::from_def(1, 0, &def),
            Err(SnapError::InvalidRadius { .. })
        ));
    }

    #[test]
    fn from_def_normalizes_authored_normal() {
        let def = AnchorDef::new(Vec3::zeros(), Vec3::new(0.0, 5.0, 0.0));
        let anchor = Anchor::from_def(1, 0, &def).unwrap();

        assert!((anchor.local_normal().into_inner() - Vec3::y()).norm() < 1.0e-6);
        assert_eq!(anchor.radius(), DEFAULT_SNAPPING_RADIUS);
    }

    #[test]
    fn world_geometry_follows_owner_pose() {
        let def = AnchorDef::new(Vec3::new(1.0, 0.0, 0.0), Vec3::x());
        let anchor = Anchor::from_def(1, 0, &def).unwrap();
        let pose = Pose::new(
            Vec3::new(0.0, 2.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), 90f32.to_radians()),
        );

        let pos = anchor.world_position(&pose);
        let normal = anchor.world_normal(&pose);

        assert!((pos - Point3::new(0.0, 2.0, -1.0)).norm() < 1.0e-5);
        assert!((normal.into_inner() - Vec3::new(0.0, 0.0, -1.0)).norm() < 1.0e-5);
    }

    #[test]
    fn same_body_anchors_are_never_neighbors() {
        let anchor =
            Anchor::from_def(1, 0, &AnchorDef::new(Vec3::zeros(), Vec3::x()).with_radius(5.0))
                .unwrap();
        // A sibling on the same body: right on top of us and perfectly opposed.
        let index = LinearAnchorIndex::from_samples(vec![
            sample(1, 1, Vec3::zeros(), normal_at(180.0)),
            sample(2, 0, Vec3::new(0.5, 0.0, 0.0), normal_at(180.0)),
        ]);

        let found =
            anchor.find_compatible_neighbors(&Pose::identity(), &index, &SnapSettings::default());

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, AnchorKey::pack(2, 0));
    }

    #[test]
    fn neighbors_outside_radius_or_facing_away_are_dropped() {
        let anchor =
            Anchor::from_def(1, 0, &AnchorDef::new(Vec3::zeros(), Vec3::x()).with_radius(1.0))
                .unwrap();
        let index = LinearAnchorIndex::from_samples(vec![
            // in range, opposed
            sample(2, 0, Vec3::new(0.9, 0.0, 0.0), normal_at(180.0)),
            // out of range
            sample(3, 0, Vec3::new(1.1, 0.0, 0.0), normal_at(180.0)),
            // in range, parallel
            sample(4, 0, Vec3::new(0.2, 0.0, 0.0), normal_at(0.0)),
        ]);

        let found =
            anchor.find_compatible_neighbors(&Pose::identity(), &index, &SnapSettings::default());

        let keys: Vec<AnchorKey> = found.iter().map(|s| s.key).collect();
        assert_eq!(keys, vec![AnchorKey::pack(2, 0)]);
    }

    #[test]
    fn empty_index_yields_no_neighbors() {
        let anchor = Anchor::from_def(1, 0, &AnchorDef::new(Vec3::zeros(), Vec3::x())).unwrap();
        let index = LinearAnchorIndex::default();

        assert!(
            anchor
                .find_compatible_neighbors(&Pose::identity(), &index, &SnapSettings::default())
                .is_empty()
        );
    }
}

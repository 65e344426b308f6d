//! Selection and drag glue over a set of snappable bodies.
//!
//! Owns the bodies and the spatial index they are matched against. One body can be selected at a
//! time; only the selected body is dragged. The index is rebuilt from every body's anchors
//! whenever the set changes or a drag ends, never during a tick.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::{
    anchor_key::BodyId,
    body::SnappableBody,
    error::{Result, SnapError},
    matching::SnappingMatch,
    settings::{SnapSettings, process_settings},
    spatial::SpatialIndex,
    types::Vec3,
};

pub struct SnapController<I: SpatialIndex> {
    bodies: BTreeMap<BodyId, SnappableBody>,
    index: I,
    settings: SnapSettings,
    selected: Option<BodyId>,
}

impl<I: SpatialIndex> SnapController<I> {
    /// Controller using the process-wide settings.
    pub fn new(index: I) -> Self {
        Self::with_settings(index, *process_settings())
    }

    pub fn with_settings(index: I, settings: SnapSettings) -> Self {
        Self {
            bodies: BTreeMap::new(),
            index,
            settings,
            selected: None,
        }
    }

    #[inline]
    pub fn settings(&self) -> &SnapSettings {
        &self.settings
    }

    #[inline]
    pub fn index(&self) -> &I {
        &self.index
    }

    pub fn body(&self, id: BodyId) -> Option<&SnappableBody> {
        self.bodies.get(&id)
    }

    /// Bodies in id order.
    pub fn bodies(&self) -> impl Iterator<Item = &SnappableBody> {
        self.bodies.values()
    }

    #[inline]
    pub fn selected(&self) -> Option<BodyId> {
        self.selected
    }

    /// The body currently being dragged, if any.
    pub fn dragging(&self) -> Option<BodyId> {
        self.bodies
            .values()
            .find(|b| b.is_being_moved())
            .map(SnappableBody::id)
    }

    pub fn add_body(&mut self, body: SnappableBody) -> Result<()> {
        let id = body.id();
        if self.bodies.contains_key(&id) {
            return Err(SnapError::DuplicateBody(id));
        }
        self.bodies.insert(id, body);
        self.rebuild_index();
        Ok(())
    }

    /// Select `id`, replacing any previous selection.
    pub fn select(&mut self, id: BodyId) -> Result<()> {
        if let Some(dragging) = self.dragging() {
            return Err(SnapError::DragInProgress(dragging));
        }
        if !self.bodies.contains_key(&id) {
            return Err(SnapError::UnknownBody(id));
        }
        self.selected = Some(id);
        debug!("selected body {id}");
        Ok(())
    }

    /// Clear the selection. An active drag is released first, which may bake a snap.
    pub fn deselect(&mut self) -> Result<Option<SnappingMatch>> {
        let dragging = self
            .selected_body()?
            .is_some_and(SnappableBody::is_being_moved);
        let baked = if dragging { self.end_drag()? } else { None };
        self.selected = None;
        Ok(baked)
    }

    /// Pick up the selected body.
    pub fn begin_drag(&mut self) -> Result<()> {
        self.selected_body_mut()?.begin_move()
    }

    /// Free-drag the selected body by `delta` (world space).
    pub fn drag_by(&mut self, delta: &Vec3) -> Result<()> {
        let body = self.selected_body_mut()?;
        if !body.is_being_moved() {
            return Err(SnapError::NotMoving(body.id()));
        }
        body.translate(delta);
        Ok(())
    }

    /// Release the selected body, baking its current match if any. The index is rebuilt since
    /// the released body's anchors moved.
    pub fn end_drag(&mut self) -> Result<Option<SnappingMatch>> {
        let body = self.selected_body_mut()?;
        let id = body.id();
        let baked = body.end_move()?;
        if let Some(m) = &baked {
            info!("body {id} snapped: {m}");
        }
        self.rebuild_index();
        Ok(baked)
    }

    /// One fixed-rate step for every body being dragged. Returns the active matches.
    pub fn tick(&mut self) -> Vec<(BodyId, SnappingMatch)> {
        let (index, settings) = (&self.index, &self.settings);

        self.bodies
            .values_mut()
            .filter(|b| b.is_being_moved())
            .filter_map(|b| {
                let id = b.id();
                b.tick(index, settings).map(|m| (id, *m))
            })
            .collect()
    }

    fn rebuild_index(&mut self) {
        let samples = self
            .bodies
            .values()
            .flat_map(|b| b.anchor_samples())
            .collect();
        self.index.rebuild(samples);
    }

    fn selected_body(&self) -> Result<Option<&SnappableBody>> {
        match self.selected {
            Some(id) => self
                .bodies
                .get(&id)
                .map(Some)
                .ok_or(SnapError::UnknownBody(id)),
            None => Ok(None),
        }
    }

    fn selected_body_mut(&mut self) -> Result<&mut SnappableBody> {
        let id = self.selected.ok_or(SnapError::NothingSelected)?;
        self.bodies.get_mut(&id).ok_or(SnapError::UnknownBody(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        anchor::AnchorDef,
        anchor_key::AnchorKey,
        body::BodyDef,
        rapier_index::RapierAnchorIndex,
        spatial::LinearAnchorIndex,
        types::{Point3, Pose},
    };

    const EPS: f32 = 1.0e-4;

    /// Body `id` at `x` with one anchor on each side along X.
    fn block(id: BodyId, x: f32) -> SnappableBody {
        SnappableBody::from_def(
            BodyDef::new(id, Pose::from_translation(Vec3::new(x, 0.0, 0.0)))
                .with_anchor(AnchorDef::new(Vec3::new(0.5, 0.0, 0.0), Vec3::x()))
                .with_anchor(AnchorDef::new(Vec3::new(-0.5, 0.0, 0.0), -Vec3::x())),
        )
        .unwrap()
    }

    fn two_blocks<I: SpatialIndex>(index: I) -> SnapController<I> {
        let mut ctl = SnapController::with_settings(index, SnapSettings::default());
        ctl.add_body(block(1, 0.0)).unwrap();
        ctl.add_body(block(2, 3.0)).unwrap();
        ctl
    }

    fn drag_and_snap<I: SpatialIndex>(mut ctl: SnapController<I>) {
        assert_eq!(ctl.index().len(), 4);

        ctl.select(1).unwrap();
        ctl.begin_drag().unwrap();

        // Nothing in range yet.
        assert!(ctl.tick().is_empty());

        // Bring body 1's +X anchor (now 0.5) to within 0.3 of body 2's -X anchor (2.5).
        ctl.drag_by(&Vec3::new(1.7, 0.1, 0.0)).unwrap();
        let active = ctl.tick();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].0, 1);
        assert_eq!(active[0].1.other().key, AnchorKey::pack(2, 1));

        let baked = ctl.end_drag().unwrap().unwrap();
        assert_eq!(baked.own().key, AnchorKey::pack(1, 0));

        let body = ctl.body(1).unwrap();
        assert!((body.pose().translation - Vec3::new(2.0, 0.0, 0.0)).norm() < EPS);
        assert!(body.preview().is_at_identity());

        // The index now has body 1's anchors at their baked positions.
        let found = ctl.index().query_anchors_near(&Point3::new(2.5, 0.0, 0.0), 0.01);
        let mut keys: Vec<_> = found.iter().map(|s| s.key).collect();
        keys.sort();
        assert_eq!(keys, vec![AnchorKey::pack(1, 0), AnchorKey::pack(2, 1)]);
    }

    #[test]
    fn drag_and_snap_with_linear_index() {
        drag_and_snap(two_blocks(LinearAnchorIndex::default()));
    }

    #[test]
    fn drag_and_snap_with_rapier_index() {
        drag_and_snap(two_blocks(RapierAnchorIndex::default()));
    }

    #[test]
    fn duplicate_body_is_rejected() {
        let mut ctl = two_blocks(LinearAnchorIndex::default());

        assert_eq!(
            ctl.add_body(block(2, 10.0)),
            Err(SnapError::DuplicateBody(2))
        );
        assert_eq!(ctl.bodies().count(), 2);
    }

    #[test]
    fn selection_errors() {
        let mut ctl = two_blocks(LinearAnchorIndex::default());

        assert_eq!(ctl.begin_drag(), Err(SnapError::NothingSelected));
        assert_eq!(ctl.select(7), Err(SnapError::UnknownBody(7)));
        assert_eq!(ctl.selected(), None);

        ctl.select(1).unwrap();
        assert_eq!(
            ctl.drag_by(&Vec3::x()),
            Err(SnapError::NotMoving(1)),
            "dragging requires a begun drag"
        );

        ctl.begin_drag().unwrap();
        assert_eq!(ctl.begin_drag(), Err(SnapError::AlreadyMoving(1)));
        assert_eq!(ctl.select(2), Err(SnapError::DragInProgress(1)));
        assert_eq!(ctl.selected(), Some(1));
    }

    #[test]
    fn deselect_releases_an_active_drag() {
        let mut ctl = two_blocks(LinearAnchorIndex::default());
        ctl.select(2).unwrap();
        ctl.begin_drag().unwrap();
        ctl.drag_by(&Vec3::new(-1.8, 0.0, 0.0)).unwrap();
        assert_eq!(ctl.tick().len(), 1);

        let baked = ctl.deselect().unwrap();

        assert!(baked.is_some());
        assert_eq!(ctl.selected(), None);
        assert_eq!(ctl.dragging(), None);
        let body = ctl.body(2).unwrap();
        assert!((body.pose().translation - Vec3::new(1.0, 0.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn end_drag_out_of_range_leaves_body_where_dropped() {
        let mut ctl = two_blocks(LinearAnchorIndex::default());
        ctl.select(1).unwrap();
        ctl.begin_drag().unwrap();
        ctl.drag_by(&Vec3::new(0.0, 0.0, 4.0)).unwrap();
        assert!(ctl.tick().is_empty());

        assert_eq!(ctl.end_drag(), Ok(None));
        assert_eq!(ctl.end_drag(), Err(SnapError::NotMoving(1)));

        let found = ctl.index().query_anchors_near(&Point3::new(0.5, 0.0, 4.0), 0.01);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].key, AnchorKey::pack(1, 0));
    }

    #[test]
    fn idle_bodies_are_not_ticked() {
        let mut ctl =
            SnapController::with_settings(LinearAnchorIndex::default(), SnapSettings::default());
        // Touching and facing each other, but nobody is dragging.
        ctl.add_body(block(1, 0.0)).unwrap();
        ctl.add_body(block(2, 1.0)).unwrap();

        assert!(ctl.tick().is_empty());
        assert!(ctl.bodies().all(|b| !b.is_snapping()));
    }
}

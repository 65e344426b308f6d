//! Snappable bodies: own a set of anchors, search for the best match while being moved,
//! preview it on the surrogate and bake it on release.
//!
//! State machine
//! - `Idle`: not being moved, no match.
//! - `Dragging`: between [`SnappableBody::begin_move`] and [`SnappableBody::end_move`]; each
//!   [`SnappableBody::tick`] recomputes the match.
//!
//! Invariants
//! - `current_match` is only `Some` while dragging; `end_move` always clears it.
//! - The preview surrogate's offset is identity whenever there is no current match.
//! - The outer pose only changes through the drag controller or a bake.

use log::{debug, info, warn};

use crate::{
    anchor::{Anchor, AnchorDef, AnchorSample},
    anchor_key::{AnchorIndex, AnchorKey, BodyId},
    error::{Result, SnapError},
    matching::{SnappingMatch, best_match},
    preview::PreviewSurrogate,
    settings::SnapSettings,
    spatial::SpatialIndex,
    types::{Pose, Vec3},
};

/// Authored body, as it comes from scene data.
#[derive(Clone, Debug, Default)]
pub struct BodyDef {
    pub id: BodyId,
    /// Outer (world) pose.
    pub pose: Pose,
    pub anchors: Vec<AnchorDef>,
    /// The stand-in tentative snaps are applied to. Missing is tolerated with a warning.
    pub preview: Option<PreviewSurrogate>,
}

impl BodyDef {
    pub fn new(id: BodyId, pose: Pose) -> Self {
        Self {
            id,
            pose,
            anchors: Vec::new(),
            preview: Some(PreviewSurrogate::new()),
        }
    }

    pub fn with_anchor(mut self, anchor: AnchorDef) -> Self {
        self.anchors.push(anchor);
        self
    }

    pub fn with_preview(mut self, preview: Option<PreviewSurrogate>) -> Self {
        self.preview = preview;
        self
    }
}

/// Non-fatal configuration issues found while building a body.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfigWarning {
    /// No preview surrogate was authored; a default one at identity is used.
    MissingPreview,
    /// The body has no anchors and can never snap.
    NoAnchors,
    /// The surrogate was authored away from the body origin and has been reset.
    PreviewOffsetReset { offset: Pose },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BodyState {
    Idle,
    Dragging,
}

#[derive(Clone, Debug)]
pub struct SnappableBody {
    id: BodyId,
    pose: Pose,
    anchors: Vec<Anchor>,
    preview: PreviewSurrogate,
    is_being_moved: bool,
    current_match: Option<SnappingMatch>,
    warnings: Vec<ConfigWarning>,
}

impl SnappableBody {
    /// Validate an authored body.
    ///
    /// Invalid anchors (zero normal, bad radius) are errors. A missing surrogate, an empty
    /// anchor set or a surrogate not at the body origin are logged, recorded in
    /// [`config_warnings`](Self::config_warnings) and repaired best-effort.
    pub fn from_def(def: BodyDef) -> Result<Self> {
        let BodyDef {
            id,
            pose,
            anchors: anchor_defs,
            preview,
        } = def;

        let anchors = anchor_defs
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let index = AnchorIndex::try_from(i).map_err(|_| SnapError::TooManyAnchors(id))?;
                Anchor::from_def(id, index, a)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut warnings = Vec::new();

        let mut preview = match preview {
            Some(p) => p,
            None => {
                warn!("body {id}: no preview surrogate found, using a default one");
                warnings.push(ConfigWarning::MissingPreview);
                PreviewSurrogate::new()
            }
        };

        if !preview.is_at_identity() {
            let offset = *preview.local_offset();
            warn!(
                "body {id}: preview surrogate should sit at the body origin instead of {:?}",
                offset.translation
            );
            warnings.push(ConfigWarning::PreviewOffsetReset { offset });
            preview.reset_to_identity();
        }

        if anchors.is_empty() {
            warn!("body {id}: no anchors found, it will never snap");
            warnings.push(ConfigWarning::NoAnchors);
        }

        info!("body {id}: anchors found: {}", anchors.len());

        Ok(Self {
            id,
            pose,
            anchors,
            preview,
            is_being_moved: false,
            current_match: None,
            warnings,
        })
    }

    #[inline]
    pub fn id(&self) -> BodyId {
        self.id
    }

    /// Outer (world) pose, the one the drag controller moves.
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    #[inline]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    #[inline]
    pub fn preview(&self) -> &PreviewSurrogate {
        &self.preview
    }

    /// Where the preview surrogate currently sits in world space.
    #[inline]
    pub fn preview_pose(&self) -> Pose {
        self.preview.world_pose(&self.pose)
    }

    #[inline]
    pub fn config_warnings(&self) -> &[ConfigWarning] {
        &self.warnings
    }

    #[inline]
    pub fn state(&self) -> BodyState {
        if self.is_being_moved {
            BodyState::Dragging
        } else {
            BodyState::Idle
        }
    }

    #[inline]
    pub fn is_being_moved(&self) -> bool {
        self.is_being_moved
    }

    #[inline]
    pub fn is_snapping(&self) -> bool {
        self.current_match.is_some()
    }

    #[inline]
    pub fn current_match(&self) -> Option<&SnappingMatch> {
        self.current_match.as_ref()
    }

    /// World-space samples of every owned anchor at the current outer pose.
    pub fn anchor_samples(&self) -> impl Iterator<Item = AnchorSample> + '_ {
        self.anchors.iter().map(|a| a.sample(&self.pose))
    }

    pub fn owns(&self, key: AnchorKey) -> bool {
        key.body() == self.id && (key.index() as usize) < self.anchors.len()
    }

    /// Free-drag: move the outer pose by `delta` in world space.
    pub fn translate(&mut self, delta: &Vec3) {
        self.pose.translate(delta);
    }

    /// Free-drag: place the outer pose directly.
    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    /// The body has been picked up. From now on every tick searches for a snap until
    /// [`end_move`](Self::end_move).
    pub fn begin_move(&mut self) -> Result<()> {
        if self.is_being_moved {
            return Err(SnapError::AlreadyMoving(self.id));
        }
        self.is_being_moved = true;
        Ok(())
    }

    /// Let go of the body.
    ///
    /// If it is currently in snapping range of another body, the match is baked onto the
    /// outer pose (pivoting about the foreign anchor) and the surrogate is reset to the body
    /// origin, which keeps it visually in place since the outer pose moved there.
    /// Returns the baked match, if any.
    pub fn end_move(&mut self) -> Result<Option<SnappingMatch>> {
        if !self.is_being_moved {
            return Err(SnapError::NotMoving(self.id));
        }

        let baked = self.current_match.take().map(|m| {
            // Re-sample our anchor: the controller may have moved us since the last tick.
            let live = match self.anchors.get(m.own().key.index() as usize) {
                Some(anchor) => m.with_own(anchor.sample(&self.pose)),
                None => m,
            };
            self.pose = live.apply_to(&self.pose);
            self.preview.reset_to_identity();
            debug!("body {}: baked {live}", self.id);
            live
        });

        self.is_being_moved = false;
        Ok(baked)
    }

    /// One fixed-rate step. No-op unless being moved.
    ///
    /// Recomputes the best match; applies it to the surrogate when found, and reverts the
    /// surrogate when a previous match was lost.
    pub fn tick<I>(&mut self, index: &I, settings: &SnapSettings) -> Option<&SnappingMatch>
    where
        I: SpatialIndex + ?Sized,
    {
        if !self.is_being_moved {
            return None;
        }

        let was_snapping = self.is_snapping();
        self.current_match = self.find_best_match(index, settings);

        match self.current_match {
            Some(m) => {
                debug!("body {}: found snapping {m}", self.id);
                self.preview_match(&m);
            }
            None if was_snapping => {
                // Left the radius of the anchor: back to the body origin.
                debug!("body {}: snapping lost", self.id);
                self.preview.reset_to_identity();
            }
            None => {}
        }

        self.current_match.as_ref()
    }

    /// Nearest compatible pairing across all owned anchors, without changing any state.
    pub fn find_best_match<I>(&self, index: &I, settings: &SnapSettings) -> Option<SnappingMatch>
    where
        I: SpatialIndex + ?Sized,
    {
        best_match(self.anchors.iter().flat_map(|anchor| {
            let own = anchor.sample(&self.pose);
            anchor
                .find_compatible_neighbors(&self.pose, index, settings)
                .into_iter()
                .map(move |other| SnappingMatch::new(own, other))
        }))
    }

    /// Put the surrogate where the body would land if `m` were baked right now.
    fn preview_match(&mut self, m: &SnappingMatch) {
        let local = m.apply_to(&self.pose).relative_to(&self.pose);
        self.preview
            .set_local_offset(local.translation, local.rotation);
    }
}

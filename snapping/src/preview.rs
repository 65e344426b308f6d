//! Preview surrogate: the stand-in a tentative snap is applied to.
//!
//! The drag controller moves a body's outer pose; the surrogate hangs off that pose with a
//! local offset. While a match is being previewed the offset carries the alignment, so the
//! geometry shows where the body would land while the outer pose stays under the user's hand.
//! Resetting the offset to identity reverts the preview without touching the outer pose.

use crate::{
    settings::PREVIEW_IDENTITY_EPS,
    types::{Pose, Quat, Vec3},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreviewSurrogate {
    local: Pose,
    /// Disabled while it carries a tentative snap: it represents geometry only, not
    /// collidable or interactive state.
    enabled: bool,
}

impl Default for PreviewSurrogate {
    fn default() -> Self {
        Self {
            local: Pose::identity(),
            enabled: true,
        }
    }
}

impl PreviewSurrogate {
    pub fn new() -> Self {
        Self::default()
    }

    /// A surrogate authored with a (possibly wrong) local offset, as found in scene data.
    pub fn with_local_offset(local: Pose) -> Self {
        Self {
            local,
            enabled: true,
        }
    }

    /// Carry a tentative snap. The surrogate is disabled until reset.
    pub fn set_local_offset(&mut self, translation: Vec3, rotation: Quat) {
        self.local = Pose::new(translation, rotation);
        self.enabled = false;
    }

    /// Drop any tentative snap and sit exactly on the parent's origin again.
    pub fn reset_to_identity(&mut self) {
        self.local = Pose::identity();
        self.enabled = true;
    }

    #[inline]
    pub fn local_offset(&self) -> &Pose {
        &self.local
    }

    #[inline]
    pub fn is_at_identity(&self) -> bool {
        self.local.is_identity(PREVIEW_IDENTITY_EPS)
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// World pose of the surrogate given its parent's (the body's outer) pose.
    #[inline]
    pub fn world_pose(&self, parent: &Pose) -> Pose {
        parent.compose(&self.local)
    }
}

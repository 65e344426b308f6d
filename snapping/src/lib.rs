//! Anchor-based snapping for interactively dragged rigid bodies.
//!
//! Bodies carry anchors (a point plus an outward normal). While a body is dragged, every tick
//! looks for the nearest compatible anchor on another body and previews the aligned pose on a
//! surrogate; releasing the body bakes that pose.

pub mod anchor;
pub mod anchor_key;
pub mod body;
pub mod controller;
pub mod error;
pub mod matching;
pub mod preview;
pub mod rapier_index;
pub mod settings;
pub mod spatial;
pub mod types;

pub use anchor::{Anchor, AnchorDef, AnchorSample, normal_angle_deg, normals_compatible};
pub use anchor_key::{AnchorIndex, AnchorKey, BodyId};
pub use body::{BodyDef, BodyState, ConfigWarning, SnappableBody};
pub use controller::SnapController;
pub use error::{Result, SnapError};
pub use matching::{SnappingMatch, best_match};
pub use preview::PreviewSurrogate;
pub use rapier_index::RapierAnchorIndex;
pub use settings::{
    ANCHOR_PROBE_RADIUS, ANGLE_EPS_DEG, DEFAULT_SNAPPING_ANGLE_DEG, DEFAULT_SNAPPING_RADIUS,
    DIST_EPS, PREVIEW_IDENTITY_EPS, SnapSettings, install_process_settings, process_settings,
};
pub use spatial::{LinearAnchorIndex, SpatialIndex};
pub use types::{Point3, Pose, Quat, UnitVec3, Vec3, rotation_onto};

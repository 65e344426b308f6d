/*!
Snapping settings and tolerances.

These constants centralize the parameters used by anchor matching and pose alignment.
Keeping them together makes tuning easier and keeps the search deterministic.

Notes
- Distances are in meters, angles in degrees unless the name says otherwise.
- Favor practical world-space tolerances over machine epsilon for robust behavior.
- The angular tolerance is process-wide by default, but every search takes an explicit
  [`SnapSettings`] so callers can thread their own value.
*/

use std::sync::OnceLock;

use crate::error::{Result, SnapError};

/// Default angular tolerance (degrees).
///
/// Two anchors are compatible when the angle between their normals is greater than
/// `180 - tolerance`, i.e. they face each other. With 120 that means anything above 60.
pub const DEFAULT_SNAPPING_ANGLE_DEG: f32 = 120.0;

/// Slack applied to the angle comparison (degrees) so the boundary itself counts as
/// compatible despite `acos` rounding.
pub const ANGLE_EPS_DEG: f32 = 1.0e-3;

/// Default per-anchor search radius (meters).
pub const DEFAULT_SNAPPING_RADIUS: f32 = 0.5;

/// Practical small distance for comparisons (meters).
/// Also the minimum length an authored normal must have to be normalized.
pub const DIST_EPS: f32 = 1.0e-6;

/// Tolerance for treating a preview surrogate offset as identity (meters / radians).
pub const PREVIEW_IDENTITY_EPS: f32 = 1.0e-5;

/// Radius of the collider each anchor gets in the Rapier-backed index (meters).
/// Only used for the broad-phase overlap; membership is decided on exact center distance.
pub const ANCHOR_PROBE_RADIUS: f32 = 1.0e-3;

/// Validated snapping configuration threaded into every search.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnapSettings {
    angle_tolerance_deg: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            angle_tolerance_deg: DEFAULT_SNAPPING_ANGLE_DEG,
        }
    }
}

impl SnapSettings {
    /// Build settings with the given angular tolerance, which must lie in `[0, 180]`.
    pub fn new(angle_tolerance_deg: f32) -> Result<Self> {
        if !(0.0..=180.0).contains(&angle_tolerance_deg) {
            return Err(SnapError::InvalidAngleTolerance(angle_tolerance_deg));
        }
        Ok(Self {
            angle_tolerance_deg,
        })
    }

    #[inline]
    pub fn angle_tolerance_deg(&self) -> f32 {
        self.angle_tolerance_deg
    }

    /// Smallest angle (degrees) two normals must exceed to be considered facing.
    #[inline]
    pub fn min_facing_angle_deg(&self) -> f32 {
        180.0 - self.angle_tolerance_deg
    }
}

static PROCESS_SETTINGS: OnceLock<SnapSettings> = OnceLock::new();

/// Return the process-wide settings, initializing them to the defaults on first use.
pub fn process_settings() -> &'static SnapSettings {
    PROCESS_SETTINGS.get_or_init(SnapSettings::default)
}

/// Install the process-wide settings. Only the first call (before any
/// [`process_settings`] read) wins; later calls hand the rejected value back.
pub fn install_process_settings(settings: SnapSettings) -> std::result::Result<(), SnapSettings> {
    PROCESS_SETTINGS.set(settings)
}

use crate::anchor_key::BodyId;

/// Errors surfaced by the snapping core.
///
/// State-machine misuse by the caller (see [`SnapError::is_illegal_state`]) leaves bodies and
/// selection untouched. Anchor and tolerance variants are configuration errors caught at
/// construction; body id variants come from the controller.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SnapError {
    #[error("body {0} is already being moved")]
    AlreadyMoving(BodyId),

    #[error("can't let go of body {0}: it was not being moved in the first place")]
    NotMoving(BodyId),

    #[error("anchor {index} of body {body} has a zero-length or non-finite normal")]
    ZeroNormal { body: BodyId, index: u32 },

    #[error("anchor {index} of body {body} has an invalid snapping radius {radius}")]
    InvalidRadius {
        body: BodyId,
        index: u32,
        radius: f32,
    },

    #[error("anchor {index} of body {body} has a non-finite local position")]
    InvalidPosition { body: BodyId, index: u32 },

    #[error("body {0} has more anchors than an anchor key can address")]
    TooManyAnchors(BodyId),

    #[error("snapping angle tolerance must be within [0, 180] degrees, got {0}")]
    InvalidAngleTolerance(f32),

    #[error("body {0} is already registered")]
    DuplicateBody(BodyId),

    #[error("unknown body {0}")]
    UnknownBody(BodyId),

    #[error("no body is selected")]
    NothingSelected,

    #[error("body {0} is being dragged; release it before changing the selection")]
    DragInProgress(BodyId),
}

impl SnapError {
    /// True for errors caused by calling a state transition at the wrong time.
    pub fn is_illegal_state(&self) -> bool {
        matches!(
            self,
            SnapError::AlreadyMoving(_)
                | SnapError::NotMoving(_)
                | SnapError::NothingSelected
                | SnapError::DragInProgress(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SnapError>;

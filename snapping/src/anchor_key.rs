/// Identifier of a snappable body. Unique within one controller / index.
pub type BodyId = u64;

/// Position of an anchor within its body's anchor list.
pub type AnchorIndex = u32;

/// Globally-unique identifier for an anchor: which body owns it, and which of that body's
/// anchors it is.
///
/// # Why this exists
/// The spatial index hands anchors back by value, and the Rapier-backed index only carries a
/// single `u128` of `user_data` per collider. Packing `(body, index)` into one `u128` lets an
/// anchor round-trip through the physics engine and lets same-body exclusion be a plain
/// integer comparison.
///
/// # Bit layout
/// Least-significant bit = bit 0:
///
/// - bits 0..=63   : `BodyId` (u64)
/// - bits 64..=95  : `AnchorIndex` (u32)
/// - bits 96..=127 : reserved (must be zero for now)
///
/// # Invariants
/// - Two different `(body, index)` pairs never produce the same key.
/// - Reserved bits remain zero.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnchorKey(u128);

const INDEX_SHIFT: u32 = BodyId::BITS;
const RESERVED_SHIFT: u32 = BodyId::BITS + AnchorIndex::BITS;

impl AnchorKey {
    /// Packs a body id and an anchor index into a key.
    ///
    /// # Examples
    /// ```
    /// use snapping::AnchorKey;
    /// let key = AnchorKey::pack(42, 3);
    /// assert_eq!(key.body(), 42);
    /// assert_eq!(key.index(), 3);
    /// ```
    #[inline]
    pub fn pack(body: BodyId, index: AnchorIndex) -> Self {
        Self((body as u128) | ((index as u128) << INDEX_SHIFT))
    }

    /// Extracts the owning [`BodyId`].
    #[inline]
    pub fn body(self) -> BodyId {
        const BODY_MASK: u128 = u64::MAX as u128;
        (self.0 & BODY_MASK) as BodyId
    }

    /// Extracts the [`AnchorIndex`] within the owning body.
    #[inline]
    pub fn index(self) -> AnchorIndex {
        const INDEX_MASK: u128 = u32::MAX as u128;
        ((self.0 >> INDEX_SHIFT) & INDEX_MASK) as AnchorIndex
    }

    /// The packed representation, e.g. for a collider's `user_data`.
    #[inline]
    pub fn raw(self) -> u128 {
        self.0
    }

    /// Rebuilds a key from its packed representation.
    ///
    /// Use this at boundaries (e.g. collider `user_data`) to fail fast on values that were
    /// not produced by [`AnchorKey::pack`].
    pub fn from_raw(raw: u128) -> Result<Self, &'static str> {
        const RESERVED_MASK: u128 = !0u128 << RESERVED_SHIFT;
        if (raw & RESERVED_MASK) != 0 {
            return Err("AnchorKey reserved bits are non-zero");
        }
        Ok(Self(raw))
    }
}

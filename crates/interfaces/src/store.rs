use crate::StoreError;
use trellis_primitives::{Height, HeightHash, Unit};

/// Read/write access to the finalized prefix beneath the fork tree's root.
///
/// This is the only ambient dependency the tree takes, passed in explicitly
/// at construction: read a finalized unit by height, report the frontier,
/// persist a new finalized unit. Nothing else.
///
/// All calls are synchronous; implementations that front slow media are
/// expected to answer from memory for the heights the tree works over.
pub trait FinalizedStore: Send + Sync {
    /// The finalized unit at `height`, if any.
    fn unit_at(&self, height: Height) -> Result<Option<Unit>, StoreError>;

    /// Coordinate of the highest finalized unit, `None` while the store is
    /// empty.
    fn frontier(&self) -> Result<Option<HeightHash>, StoreError>;

    /// Durably append a unit at the finalized frontier.
    ///
    /// Fails with [`StoreError::NonContiguous`] if the unit does not sit
    /// directly on the frontier.
    fn persist(&mut self, unit: &Unit) -> Result<(), StoreError>;
}

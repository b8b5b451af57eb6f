use trellis_interfaces::{
    fork_tree::Branch, ForkTreeError, ForkTreeResult, StoreError,
};
use trellis_primitives::{Height, HeightHash, SegmentId, Unit};
use std::collections::BTreeMap;

/// A contiguous run of units above a fixed attachment coordinate; one
/// candidate chain extension.
///
/// The unit at [`tail`](Self::tail) is *not* owned by the segment, it is
/// inherited from wherever the segment forked. The segment's own run covers
/// `tail.height + 1 ..= head.height`, gap-free and strictly increasing, and
/// only ever grows by one at the head.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Registry identity, assigned by the tree.
    id: SegmentId,
    /// Attachment coordinate, fixed for the segment's lifetime.
    tail: HeightHash,
    /// Coordinate of the most recent owned unit; equals `tail` while empty.
    pub(crate) head: HeightHash,
    /// Owned units keyed by height.
    pub(crate) units: BTreeMap<Height, Unit>,
    /// Set once the segment has been flagged main; distinguishes `Stale`
    /// from `Growing` after a switch away.
    pub(crate) was_main: bool,
}

impl Segment {
    /// Creates an empty segment attached at `tail`.
    pub(crate) fn fork(id: SegmentId, tail: HeightHash) -> Self {
        Self { id, tail, head: tail, units: BTreeMap::new(), was_main: false }
    }

    /// The segment's registry id.
    pub fn id(&self) -> SegmentId {
        self.id
    }

    /// The attachment coordinate.
    pub fn tail_coord(&self) -> HeightHash {
        self.tail
    }

    /// The unit at `height`, if owned by this segment.
    pub(crate) fn unit(&self, height: Height) -> Option<&Unit> {
        self.units.get(&height)
    }

    /// Iterates the owned run in ascending height order.
    pub(crate) fn units(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }
}

impl Branch for Segment {
    fn head(&self) -> HeightHash {
        self.head
    }

    fn tail(&self) -> Option<HeightHash> {
        Some(self.tail)
    }

    fn len(&self) -> u64 {
        self.units.len() as u64
    }

    fn contains_height(&self, height: Height) -> bool {
        height > self.tail.height && height <= self.head.height
    }

    fn unit_at(&self, height: Height) -> Result<Option<Unit>, StoreError> {
        Ok(self.units.get(&height).cloned())
    }

    fn append(&mut self, unit: Unit) -> ForkTreeResult<HeightHash> {
        if !unit.extends(self.head) {
            return Err(ForkTreeError::BrokenLink {
                unit: unit.height_hash(),
                prev: unit.prev,
                head: self.head,
            })
        }
        self.head = unit.height_hash();
        self.units.insert(unit.height, unit);
        Ok(self.head)
    }
}

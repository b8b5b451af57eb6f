use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a segment registered in the fork tree.
///
/// Ids are handed out by the tree from a monotonic counter and are never
/// reused for the tree's lifetime, so a stale id held by a caller can only
/// miss, never alias a different segment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SegmentId(u64);

impl SegmentId {
    /// Creates a segment id from its raw counter value.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw counter value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for SegmentId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment-{}", self.0)
    }
}

//! Error types of the fork tree.

use thiserror::Error;
use trellis_primitives::{Height, HeightHash, SegmentId};

/// Canonical error type of the fork tree.
///
/// Every variant except [`CyclicResolution`](ForkTreeError::CyclicResolution)
/// is recoverable by the caller; a cyclic resolution indicates an internal
/// bookkeeping defect and the offending operation is refused rather than
/// applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForkTreeError {
    /// An appended unit's declared predecessor does not match the target
    /// branch's current head.
    #[error("unit {unit} declares predecessor {prev}, branch head is {head}")]
    BrokenLink {
        /// Coordinate of the rejected unit.
        unit: HeightHash,
        /// Predecessor coordinate the unit declared.
        prev: HeightHash,
        /// The branch head the unit was checked against.
        head: HeightHash,
    },
    /// A fork request named a coordinate that full resolution could not
    /// confirm.
    #[error("no unit found at {coord} on the parent chain")]
    UnknownCoordinate {
        /// The coordinate the fork was requested at.
        coord: HeightHash,
    },
    /// An operation targeted a segment id that is not registered.
    #[error("segment {id} is not registered")]
    UnknownSegment {
        /// The unregistered id.
        id: SegmentId,
    },
    /// A downward resolution walk revisited a segment before reaching the
    /// root, or exceeded the configured depth bound.
    #[error("resolution walk from {start} detected a cycle at {via}")]
    CyclicResolution {
        /// The segment the walk started from.
        start: SegmentId,
        /// The segment at which the walk gave up.
        via: SegmentId,
    },
    /// An operation targeted a segment whose tail was invalidated by root
    /// growth; the segment can only be pruned.
    #[error("segment {id} tail {tail} no longer reconciles with the finalized chain")]
    UnreachableSegment {
        /// The irreconcilable segment.
        id: SegmentId,
        /// Its recorded tail coordinate.
        tail: HeightHash,
    },
    /// An invariant checker found the tree in an inconsistent state.
    #[error("fork tree inconsistency: {0}")]
    Inconsistent(String),
    /// The finalized store reported a failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Error surfaced by a [`FinalizedStore`](crate::store::FinalizedStore)
/// implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A persisted unit does not extend the store's frontier.
    #[error("unit at height {height} does not extend the finalized frontier {frontier}")]
    NonContiguous {
        /// Height of the rejected unit.
        height: Height,
        /// Height of the store's current frontier.
        frontier: Height,
    },
    /// The backend failed.
    #[error("finalized store backend error: {0}")]
    Backend(String),
}

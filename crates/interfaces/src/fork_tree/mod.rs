use crate::ForkTreeResult;
use self::error::StoreError;
use trellis_primitives::{ChainInfo, Height, HeightHash, SegmentId, Unit};

pub mod error;

/// Common contract of the root segment and forked segments.
///
/// Both variants carry a contiguous, gap-free run of units and a head that
/// only advances by one on append; they differ in where the run attaches:
/// a forked segment hangs off a [`tail`](Branch::tail) coordinate owned by an
/// ancestor, while the root owns its run outright from the genesis coordinate
/// upward.
pub trait Branch {
    /// Coordinate of the most recent unit of this branch.
    ///
    /// For an empty forked segment this equals its tail; for an empty root it
    /// equals the genesis coordinate.
    fn head(&self) -> HeightHash;

    /// The attachment coordinate, or `None` for the root.
    fn tail(&self) -> Option<HeightHash>;

    /// Number of units owned by this branch.
    fn len(&self) -> u64;

    /// Whether this branch owns no units yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `height` falls inside this branch's own span.
    fn contains_height(&self, height: Height) -> bool;

    /// The unit at `height`, if this branch owns it.
    ///
    /// This never delegates to an ancestor; full resolution is a tree-level
    /// concern.
    fn unit_at(&self, height: Height) -> Result<Option<Unit>, StoreError>;

    /// Append a unit extending the current head.
    ///
    /// Fails with [`ForkTreeError::BrokenLink`](error::ForkTreeError::BrokenLink)
    /// if the unit's declared predecessor is not the head; the branch is left
    /// untouched in that case.
    fn append(&mut self, unit: Unit) -> ForkTreeResult<HeightHash>;
}

/// Addresses the branch an operation is issued against, without handing the
/// caller a structural reference into the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BranchRef {
    /// The currently canonical branch; the bare root when no segment is
    /// flagged main.
    Main,
    /// The finalized prefix itself.
    Root,
    /// A registered segment.
    Segment(SegmentId),
}

impl From<SegmentId> for BranchRef {
    fn from(id: SegmentId) -> Self {
        Self::Segment(id)
    }
}

/// Lifecycle classification of a registered segment.
///
/// The tree stores no per-segment state flag; the status is derived from the
/// structure on demand so it can never drift from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentStatus {
    /// Flagged main; together with its resolution chain down to root it forms
    /// the canonical chain.
    Canonical,
    /// Resolvable to root and never flagged main so far.
    Growing,
    /// Unflagged by a switch; still resolvable, may grow again or be pruned
    /// by policy.
    Stale,
    /// The tail no longer reconciles with the finalized chain; terminal, the
    /// segment can only be pruned.
    Unreachable,
}

/// Outcome of a main switch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The requested target was already flagged main.
    AlreadyMain {
        /// Head of the canonical chain.
        head: HeightHash,
    },
    /// The main flag moved.
    Switched {
        /// Highest coordinate shared by the outgoing and incoming canonical
        /// chains; the walk down both resolution chains first agrees here.
        fork_point: HeightHash,
        /// The previously flagged segment, `None` when main was the bare
        /// root.
        old_main: Option<SegmentId>,
        /// The newly flagged segment, `None` for a switch to the bare root.
        new_main: Option<SegmentId>,
    },
}

impl SwitchOutcome {
    /// Returns true if the switch was a no-op.
    pub fn is_already_main(&self) -> bool {
        matches!(self, SwitchOutcome::AlreadyMain { .. })
    }
}

/// Structural mutations of the fork tree.
///
/// Implementations serialize these behind an exclusive lock: the engine is
/// single-writer, and a mutation is observable only once fully applied.
pub trait ForkTreeEngine: Send + Sync {
    /// Register a new empty segment whose tail is the unit at `coord` on
    /// `parent`'s chain.
    ///
    /// The coordinate is confirmed by full resolution through `parent`;
    /// [`ForkTreeError::UnknownCoordinate`](error::ForkTreeError::UnknownCoordinate)
    /// is returned if no such unit exists. Sibling forks sharing a tail are
    /// allowed.
    fn fork_branch(&self, parent: BranchRef, coord: HeightHash) -> ForkTreeResult<SegmentId>;

    /// Append a unit to the head of the addressed branch.
    ///
    /// The branch need not be main. Appending to [`BranchRef::Main`] while no
    /// segment is flagged extends the root, as does [`BranchRef::Root`].
    fn add_head(&self, branch: BranchRef, unit: Unit) -> ForkTreeResult<HeightHash>;

    /// Append a unit to the root segment, persisting it to the finalized
    /// store.
    ///
    /// This is O(1): forks whose tails are overtaken by the new frontier are
    /// detected lazily on their next resolution, not rescanned here.
    fn root_head_add(&self, unit: Unit) -> ForkTreeResult<HeightHash>;

    /// Flag `target` as the canonical segment.
    ///
    /// No units are moved; the canonical chain is the logical path from the
    /// target's head down its resolution chain into the root.
    fn switch_main_to(&self, target: SegmentId) -> ForkTreeResult<SwitchOutcome>;

    /// Clear the main flag, truncating the canonical chain to the root's own
    /// head.
    fn switch_main_to_empty(&self) -> SwitchOutcome;

    /// Remove every segment whose tail no longer reconciles with the
    /// finalized chain, cascading through segments orphaned by the removal.
    ///
    /// Returns the removed ids in ascending order.
    fn prune_unreachable(&self) -> ForkTreeResult<Vec<SegmentId>>;
}

/// Read-only functionality of the fork tree.
pub trait ForkTreeViewer: Send + Sync {
    /// The currently canonical segment, or `None` when main is the bare root.
    fn main(&self) -> Option<SegmentId>;

    /// Head of the canonical chain; the root head when main is empty.
    fn main_head(&self) -> HeightHash;

    /// Current status of the canonical chain's head.
    fn chain_info(&self) -> ChainInfo;

    /// Head coordinate of the addressed branch.
    fn head(&self, branch: BranchRef) -> ForkTreeResult<HeightHash>;

    /// The unit at `height` on the addressed branch's chain.
    ///
    /// With `local_only` set, only the branch's own run is consulted. Without
    /// it, heights at or below the branch's tail delegate down the resolution
    /// chain, costing O(fork depth) rather than O(chain length).
    fn lookup(
        &self,
        branch: BranchRef,
        height: Height,
        local_only: bool,
    ) -> ForkTreeResult<Option<Unit>>;

    /// Derived lifecycle status of a registered segment.
    fn segment_status(&self, id: SegmentId) -> ForkTreeResult<SegmentStatus>;

    /// Ids of all registered segments, in ascending order.
    fn segment_ids(&self) -> Vec<SegmentId>;

    /// Whether `id` is registered.
    fn contains(&self, id: SegmentId) -> bool {
        self.segment_ids().binary_search(&id).is_ok()
    }
}

//! Implementation of [`ForkTree`].

use crate::{config::ForkTreeConfig, root::RootSegment, segment::Segment};
use std::collections::{HashMap, HashSet};
use tracing::{debug, error, info, trace};
use trellis_interfaces::{
    fork_tree::{Branch, BranchRef, SegmentStatus, SwitchOutcome},
    store::FinalizedStore,
    ForkTreeError, ForkTreeResult,
};
use trellis_primitives::{ChainInfo, Height, HeightHash, SegmentId, Unit};

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Tree of competing candidate chains above a single finalized prefix.
///
/// Green units belong to the root segment, the finalized prefix every fork
/// ultimately attaches to. Each registered segment carries only its own
/// incremental run of units above its tail coordinate; the canonical chain is
/// the logical path from the main segment's head down its tail-resolution
/// chain into the root.
///
/// ```mermaid
/// flowchart BT
/// subgraph root segment
/// unit0:::root --> unit1:::root --> unit2:::root --> unit3:::root --> unit4:::root
/// end
/// subgraph segment2
/// unit2 --> unit3s2:::fork --> unit4s2:::fork --> unit5s2:::fork
/// end
/// subgraph segment1
/// unit4 --> unit5s1:::main --> unit6s1:::main
/// end
/// classDef root fill:#8AC926
/// classDef main fill:#1882C4
/// classDef fork fill:#FF595E
/// ```
///
/// Main functions:
/// * [`ForkTree::fork_branch`]: register a new empty segment attached at a
///   confirmed coordinate of an existing chain.
/// * [`ForkTree::add_head`]: extend a branch by one unit.
/// * [`ForkTree::root_head_add`]: extend the finalized prefix itself.
/// * [`ForkTree::switch_main_to`]: atomically re-flag which segment is
///   canonical; no units are copied or moved.
///
/// Segments hold no references to each other: every cross-segment step is a
/// coordinate lookup through the registry, so a segment can be pruned without
/// invalidating any other segment's state.
#[derive(Debug)]
pub struct ForkTree<S> {
    /// The finalized prefix; grows only via [`ForkTree::root_head_add`].
    pub(crate) root: RootSegment<S>,
    /// All registered non-root segments.
    pub(crate) segments: HashMap<SegmentId, Segment>,
    /// The currently canonical segment; `None` means "root only, no
    /// extension".
    pub(crate) main: Option<SegmentId>,
    /// Static segment id generator; ids are never reused.
    pub(crate) segment_id_generator: u64,
    /// Running count of units accepted and currently owned by the tree,
    /// checked against the stored totals by `check_size`.
    pub(crate) inserted_units: u64,
    /// Tree configuration.
    pub(crate) config: ForkTreeConfig,
}

/// Internal result of resolving a [`BranchRef`] against the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolved {
    Root,
    Segment(SegmentId),
}

impl<S: FinalizedStore> ForkTree<S> {
    /// Create a new fork tree over an opened root segment.
    ///
    /// Main starts empty: the canonical chain is the root itself with zero
    /// extension.
    pub fn new(root: RootSegment<S>, config: ForkTreeConfig) -> Self {
        let inserted_units = root.len();
        info!(target: "fork_tree", root_head = %root.head(), "Initialized fork tree");
        Self {
            root,
            segments: HashMap::new(),
            main: None,
            segment_id_generator: 0,
            inserted_units,
            config,
        }
    }

    /// The tree configuration.
    pub fn config(&self) -> ForkTreeConfig {
        self.config
    }

    /// The root segment.
    pub fn root(&self) -> &RootSegment<S> {
        &self.root
    }

    /// Id of the currently canonical segment, `None` when main is the bare
    /// root.
    pub fn main(&self) -> Option<SegmentId> {
        self.main
    }

    /// The currently canonical segment, `None` when main is the bare root.
    pub fn main_segment(&self) -> Option<&Segment> {
        self.main.and_then(|id| self.segments.get(&id))
    }

    /// Head of the canonical chain; falls back to the root head while main
    /// is empty.
    pub fn main_head(&self) -> HeightHash {
        self.main_segment().map(|segment| segment.head()).unwrap_or_else(|| self.root.head())
    }

    /// Current status of the canonical chain's head.
    pub fn chain_info(&self) -> ChainInfo {
        let head = self.main_head();
        ChainInfo { best_hash: head.hash, best_height: head.height }
    }

    /// Ids of all registered segments, in ascending order.
    pub fn segment_ids(&self) -> Vec<SegmentId> {
        let mut ids: Vec<_> = self.segments.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Head coordinate of the addressed branch.
    pub fn head(&self, branch: BranchRef) -> ForkTreeResult<HeightHash> {
        Ok(self.branch(branch)?.head())
    }

    /// The unit at `height` on the addressed branch's chain.
    ///
    /// With `local_only` set only the branch's own run is consulted; without
    /// it, heights at or below a segment's tail delegate down the resolution
    /// chain to whichever ancestor owns the coordinate. The delegated lookup
    /// costs O(fork depth), not O(chain length), because each segment stores
    /// only its own incremental run.
    pub fn lookup(
        &self,
        branch: BranchRef,
        height: Height,
        local_only: bool,
    ) -> ForkTreeResult<Option<Unit>> {
        trace!(target: "fork_tree", ?branch, height, local_only, "Looking up unit");
        match self.resolve_ref(branch)? {
            Resolved::Root => Ok(self.root.unit_at(height)?),
            Resolved::Segment(id) => {
                let segment = self.registered(id)?;
                if height > segment.tail_coord().height {
                    return Ok(segment.unit(height).cloned())
                }
                if local_only {
                    return Ok(None)
                }
                for ancestor in self.resolve_to_root(id)?.into_iter().skip(1) {
                    let ancestor =
                        self.segments.get(&ancestor).expect("resolved segment is registered");
                    if ancestor.contains_height(height) {
                        return Ok(ancestor.unit(height).cloned())
                    }
                }
                Ok(self.root.unit_at(height)?)
            }
        }
    }

    /// Register a new empty segment whose tail is the unit at `coord` on
    /// `parent`'s chain.
    ///
    /// The coordinate is confirmed by full resolution through `parent`, so a
    /// fork can attach anywhere on the parent's logical chain, including
    /// below the parent's own tail. Multiple segments may share a tail
    /// (sibling forks). Fails with
    /// [`ForkTreeError::UnknownCoordinate`] if no unit with that hash exists
    /// at that height on the parent chain.
    pub fn fork_branch(
        &mut self,
        parent: BranchRef,
        coord: HeightHash,
    ) -> ForkTreeResult<SegmentId> {
        let resolved = self.resolve_ref(parent)?;
        // the bare genesis coordinate carries no unit but is shared by every
        // chain, so it is always a valid attachment point
        if coord != self.root.genesis() {
            let branch = match resolved {
                Resolved::Root => BranchRef::Root,
                Resolved::Segment(id) => BranchRef::Segment(id),
            };
            match self.lookup(branch, coord.height, false)? {
                Some(unit) if unit.hash == coord.hash => {}
                _ => return Err(ForkTreeError::UnknownCoordinate { coord }),
            }
        }

        let id = SegmentId::new(self.segment_id_generator);
        self.segment_id_generator += 1;
        self.segments.insert(id, Segment::fork(id, coord));
        debug!(target: "fork_tree", %id, tail = %coord, "Registered new fork");
        Ok(id)
    }

    /// Append a unit to the head of the addressed branch.
    ///
    /// The branch need not be main. Appending to [`BranchRef::Main`] while
    /// no segment is flagged extends the root itself. Appending to a segment
    /// whose tail was invalidated by root growth fails with
    /// [`ForkTreeError::UnreachableSegment`]; the lazy invalidation check
    /// runs here because an append is a resolution point.
    pub fn add_head(&mut self, branch: BranchRef, unit: Unit) -> ForkTreeResult<HeightHash> {
        match self.resolve_ref(branch)? {
            Resolved::Root => self.root_head_add(unit),
            Resolved::Segment(id) => {
                self.resolve_to_root(id)?;
                let segment =
                    self.segments.get_mut(&id).expect("resolved segment is registered");
                let head = segment.append(unit)?;
                self.inserted_units += 1;
                debug!(target: "fork_tree", %id, head = %head, "Extended segment head");
                Ok(head)
            }
        }
    }

    /// Append a unit to the root segment, persisting it to the finalized
    /// store.
    ///
    /// This is the only mutation permitted on the root. It is O(1) in the
    /// number of registered segments: a fork whose tail coordinate is
    /// overtaken by the new frontier is detected lazily on its next
    /// resolution, not rescanned here.
    pub fn root_head_add(&mut self, unit: Unit) -> ForkTreeResult<HeightHash> {
        let head = self.root.append(unit)?;
        self.inserted_units += 1;
        debug!(target: "fork_tree", head = %head, "Extended root head");
        Ok(head)
    }

    /// Flag `target` as the canonical segment.
    ///
    /// The target's resolution chain is walked down to the root first; the
    /// switch is refused if the chain no longer reconciles with the
    /// finalized prefix ([`ForkTreeError::UnreachableSegment`]) or revisits
    /// a segment ([`ForkTreeError::CyclicResolution`], an internal defect).
    ///
    /// No units are copied or moved: the canonical chain is the logical path
    /// from the target's head down through its tail-resolution chain. The
    /// outgoing main remains registered as an ordinary fork.
    pub fn switch_main_to(&mut self, target: SegmentId) -> ForkTreeResult<SwitchOutcome> {
        if !self.segments.contains_key(&target) {
            return Err(ForkTreeError::UnknownSegment { id: target })
        }
        if self.main == Some(target) {
            debug!(target: "fork_tree", id = %target, "Segment is already main");
            return Ok(SwitchOutcome::AlreadyMain { head: self.main_head() })
        }

        let new_path = self.resolve_to_root(target)?;
        let fork_point = self.fork_point(self.main, &new_path);

        let old_main = self.main.replace(target);
        self.segments.get_mut(&target).expect("presence checked above").was_main = true;
        info!(
            target: "fork_tree",
            old = ?old_main, new = %target, fork_point = %fork_point,
            "Switched main"
        );
        Ok(SwitchOutcome::Switched { fork_point, old_main, new_main: Some(target) })
    }

    /// Clear the main flag, truncating the canonical chain to the root's own
    /// head.
    ///
    /// Used when no live fork is judged better than the finalized prefix
    /// itself.
    pub fn switch_main_to_empty(&mut self) -> SwitchOutcome {
        let Some(old_main) = self.main.take() else {
            return SwitchOutcome::AlreadyMain { head: self.root.head() }
        };
        let fork_point = self.fork_point(Some(old_main), &[]);
        info!(
            target: "fork_tree",
            old = %old_main, fork_point = %fork_point,
            "Switched main to bare root"
        );
        SwitchOutcome::Switched { fork_point, old_main: Some(old_main), new_main: None }
    }

    /// Derived lifecycle status of a registered segment.
    pub fn segment_status(&self, id: SegmentId) -> ForkTreeResult<SegmentStatus> {
        let segment = self.registered(id)?;
        if self.main == Some(id) {
            return Ok(SegmentStatus::Canonical)
        }
        match self.resolve_to_root(id) {
            Ok(_) if segment.was_main => Ok(SegmentStatus::Stale),
            Ok(_) => Ok(SegmentStatus::Growing),
            Err(ForkTreeError::UnreachableSegment { .. }) => Ok(SegmentStatus::Unreachable),
            Err(err) => Err(err),
        }
    }

    /// Remove every segment whose tail no longer reconciles with the
    /// finalized chain.
    ///
    /// Removing a segment orphans the forks hanging off it, so the sweep
    /// repeats until it finds nothing more to remove. Returns the removed
    /// ids in ascending order. A pruned main leaves the canonical chain
    /// truncated to the root head.
    pub fn prune_unreachable(&mut self) -> ForkTreeResult<Vec<SegmentId>> {
        let mut removed = Vec::new();
        loop {
            let mut doomed = Vec::new();
            for id in self.segment_ids() {
                match self.resolve_to_root(id) {
                    Ok(_) => {}
                    Err(ForkTreeError::UnreachableSegment { .. }) => doomed.push(id),
                    Err(err) => return Err(err),
                }
            }
            if doomed.is_empty() {
                break
            }
            for id in doomed {
                let segment =
                    self.segments.remove(&id).expect("doomed segment is registered");
                self.inserted_units -= segment.len();
                if self.main == Some(id) {
                    self.main = None;
                }
                debug!(target: "fork_tree", %id, units = segment.len(), "Pruned unreachable segment");
                removed.push(id);
            }
        }
        removed.sort_unstable();
        Ok(removed)
    }

    /// Walk the resolution chain of `start` down to the root.
    ///
    /// Returns the traversed segment ids, `start` first. Each hop finds the
    /// owner of the current tail coordinate: a tail at or below the root's
    /// frontier must reconcile with the root itself, anything above it must
    /// be owned by another registered segment.
    pub(crate) fn resolve_to_root(&self, start: SegmentId) -> ForkTreeResult<Vec<SegmentId>> {
        let mut current = self.registered(start)?;
        let mut path = vec![start];
        let mut visited: HashSet<SegmentId> = path.iter().copied().collect();
        loop {
            if path.len() as u64 > self.config.max_resolution_depth() {
                error!(
                    target: "fork_tree",
                    %start, depth = path.len(),
                    "Resolution walk exceeded the depth bound"
                );
                return Err(ForkTreeError::CyclicResolution { start, via: current.id() })
            }
            let tail = current.tail_coord();
            if tail.height <= self.root.head().height {
                // the frontier has reached this coordinate: it must
                // reconcile with the finalized chain itself
                return if self.root.owns(tail)? {
                    Ok(path)
                } else {
                    Err(ForkTreeError::UnreachableSegment { id: current.id(), tail })
                }
            }
            match self.segment_owner(tail, current.id()) {
                Some(owner) => {
                    if !visited.insert(owner) {
                        error!(
                            target: "fork_tree",
                            %start, via = %owner,
                            "Resolution walk revisited a segment"
                        );
                        return Err(ForkTreeError::CyclicResolution { start, via: owner })
                    }
                    path.push(owner);
                    current = self.segments.get(&owner).expect("owner is registered");
                }
                // the owning segment is gone; this fork dangles until pruned
                None => return Err(ForkTreeError::UnreachableSegment { id: current.id(), tail }),
            }
        }
    }

    /// The registered segment owning the unit at `coord`, by coordinate
    /// scan.
    ///
    /// When sibling segments carry identical units the lowest id wins, so
    /// resolution is deterministic.
    pub(crate) fn segment_owner(
        &self,
        coord: HeightHash,
        excluding: SegmentId,
    ) -> Option<SegmentId> {
        self.segments
            .values()
            .filter(|segment| {
                segment.id() != excluding &&
                    segment.contains_height(coord.height) &&
                    segment.unit(coord.height).map_or(false, |unit| unit.hash == coord.hash)
            })
            .map(Segment::id)
            .min()
    }

    /// Highest coordinate shared by the outgoing and incoming canonical
    /// chains.
    ///
    /// Both resolution paths are compared bottom-up past their shared
    /// suffix; each chain leaves the last shared branch at the tail of its
    /// next segment, or at its own head if it ends there, and the lower of
    /// the two exits is where the chains still agree.
    fn fork_point(&self, old_main: Option<SegmentId>, new_path: &[SegmentId]) -> HeightHash {
        let old_path = match old_main {
            None => Vec::new(),
            Some(id) => self.resolve_to_root(id).unwrap_or_else(|err| {
                debug!(
                    target: "fork_tree",
                    %id, %err,
                    "Outgoing main does not resolve, fork point falls back to the root"
                );
                Vec::new()
            }),
        };

        let mut old_iter = old_path.iter().rev().peekable();
        let mut new_iter = new_path.iter().rev().peekable();
        while let (Some(old), Some(new)) = (old_iter.peek(), new_iter.peek()) {
            if old != new {
                break
            }
            old_iter.next();
            new_iter.next();
        }

        let old_exit = match old_iter.next() {
            Some(id) => self.tail_of(*id),
            None => old_path
                .first()
                .map(|id| self.head_of(*id))
                .unwrap_or_else(|| self.root.head()),
        };
        let new_exit = match new_iter.next() {
            Some(id) => self.tail_of(*id),
            None => new_path
                .first()
                .map(|id| self.head_of(*id))
                .unwrap_or_else(|| self.root.head()),
        };
        if old_exit.height <= new_exit.height {
            old_exit
        } else {
            new_exit
        }
    }

    fn tail_of(&self, id: SegmentId) -> HeightHash {
        self.segments.get(&id).expect("path segment is registered").tail_coord()
    }

    fn head_of(&self, id: SegmentId) -> HeightHash {
        self.segments.get(&id).expect("path segment is registered").head()
    }

    fn registered(&self, id: SegmentId) -> ForkTreeResult<&Segment> {
        self.segments.get(&id).ok_or(ForkTreeError::UnknownSegment { id })
    }

    fn resolve_ref(&self, branch: BranchRef) -> ForkTreeResult<Resolved> {
        match branch {
            BranchRef::Root => Ok(Resolved::Root),
            BranchRef::Main => Ok(match self.main {
                Some(id) => Resolved::Segment(id),
                None => Resolved::Root,
            }),
            BranchRef::Segment(id) => {
                self.registered(id)?;
                Ok(Resolved::Segment(id))
            }
        }
    }

    fn branch(&self, branch: BranchRef) -> ForkTreeResult<&dyn Branch> {
        Ok(match self.resolve_ref(branch)? {
            Resolved::Root => &self.root,
            Resolved::Segment(id) => self.registered(id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants;
    use assert_matches::assert_matches;
    use trellis_interfaces::test_utils::{mock_chain, mock_unit, MemoryStore};
    use trellis_primitives::UnitHash;

    fn tree_with_root(height: u64) -> ForkTree<MemoryStore> {
        let root = RootSegment::open(
            MemoryStore::with_chain(height, "root"),
            HeightHash::default(),
        )
        .unwrap();
        ForkTree::new(root, ForkTreeConfig::default())
    }

    fn grow(tree: &mut ForkTree<MemoryStore>, id: SegmentId, n: u64, tag: &str) {
        for _ in 0..n {
            let head = tree.head(id.into()).unwrap();
            tree.add_head(id.into(), mock_unit(head, tag)).unwrap();
        }
    }

    fn verify(tree: &ForkTree<MemoryStore>) {
        invariants::check_structure(tree).unwrap();
        invariants::check_size(tree).unwrap();
        invariants::check_acyclic(tree).unwrap();
    }

    #[test]
    fn switch_main_to_with_root_growth() {
        let mut tree = tree_with_root(5);
        assert_eq!(tree.main_head().height, 5);

        // fork b2 at the main head and grow it by three
        let b2 = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, b2, 3, "b2");
        assert_eq!(tree.head(b2.into()).unwrap().height, 8);

        // grow the finalized prefix underneath the fork
        for unit in mock_chain(tree.root.head(), 8, "root") {
            tree.root_head_add(unit).unwrap();
        }
        assert_eq!(tree.main_head().height, 13);

        // fork b3 at the (now advanced) main head and grow it by three
        let b3 = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, b3, 3, "b3");

        // main is still the bare root, so these extend the root itself
        for unit in mock_chain(tree.main_head(), 3, "b1") {
            tree.add_head(BranchRef::Main, unit).unwrap();
        }
        assert_eq!(tree.root.head().height, 16);
        verify(&tree);

        let outcome = tree.switch_main_to(b3).unwrap();
        assert_matches!(
            outcome,
            SwitchOutcome::Switched { fork_point, old_main: None, new_main }
                if fork_point.height == 13 && new_main == Some(b3)
        );
        assert_eq!(tree.main(), Some(b3));
        assert_eq!(tree.main_head().height, 16);
        assert_eq!(tree.chain_info().best_height, 16);
        verify(&tree);

        let outcome = tree.switch_main_to_empty();
        assert_matches!(
            outcome,
            SwitchOutcome::Switched { old_main, new_main: None, .. }
                if old_main == Some(b3)
        );
        assert_eq!(tree.main(), None);
        assert_eq!(tree.main_head(), tree.root.head());
        verify(&tree);

        // repeating the switch is a no-op
        assert!(tree.switch_main_to_empty().is_already_main());
        assert!(!tree.switch_main_to(b3).unwrap().is_already_main());
        assert!(tree.switch_main_to(b3).unwrap().is_already_main());
    }

    #[test]
    fn switch_main_to_nested_forks() {
        let mut tree = tree_with_root(4);

        // build the main chain as a real segment above a short root
        let main = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, main, 6, "main");
        tree.switch_main_to(main).unwrap();
        assert_eq!(tree.main_head().height, 10);

        // two sibling forks at height 5 of main
        let at5 = tree.lookup(BranchRef::Main, 5, false).unwrap().unwrap();
        let b2a = tree.fork_branch(BranchRef::Main, at5.height_hash()).unwrap();
        grow(&mut tree, b2a, 2, "b1");
        let b2b = tree.fork_branch(BranchRef::Main, at5.height_hash()).unwrap();
        grow(&mut tree, b2b, 4, "b2");
        assert_eq!(tree.head(b2b.into()).unwrap().height, 9);

        // a second-level fork at height 6 of b2b
        let at6 = tree.lookup(b2b.into(), 6, false).unwrap().unwrap();
        let b3 = tree.fork_branch(b2b.into(), at6.height_hash()).unwrap();
        grow(&mut tree, b3, 4, "b2x");
        assert_eq!(tree.head(b3.into()).unwrap().height, 10);

        // and a third top-level fork at height 6 of main
        let at6_main = tree.lookup(BranchRef::Main, 6, false).unwrap().unwrap();
        let b3_top = tree.fork_branch(BranchRef::Main, at6_main.height_hash()).unwrap();
        grow(&mut tree, b3_top, 4, "b3");

        let outcome = tree.switch_main_to(b3).unwrap();
        assert_matches!(
            outcome,
            SwitchOutcome::Switched { fork_point, old_main, .. }
                if fork_point == at5.height_hash() && old_main == Some(main)
        );
        verify(&tree);

        assert_eq!(tree.segment_status(b3).unwrap(), SegmentStatus::Canonical);
        assert_eq!(tree.segment_status(main).unwrap(), SegmentStatus::Stale);
        assert_eq!(tree.segment_status(b2a).unwrap(), SegmentStatus::Growing);

        // switching between cousins meets below both divergence points
        let outcome = tree.switch_main_to(b3_top).unwrap();
        assert_matches!(
            outcome,
            SwitchOutcome::Switched { fork_point, .. } if fork_point == at5.height_hash()
        );
        verify(&tree);
    }

    #[test]
    fn lookup_delegates_down_the_resolution_chain() {
        let mut tree = tree_with_root(5);
        let b2 = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, b2, 2, "b2");
        let at7 = tree.lookup(b2.into(), 7, false).unwrap().unwrap();
        let b3 = tree.fork_branch(b2.into(), at7.height_hash()).unwrap();

        // own run first, ancestors below the tail
        assert_eq!(tree.lookup(b3.into(), 7, false).unwrap().unwrap(), at7);
        let root3 = tree.lookup(BranchRef::Root, 3, false).unwrap().unwrap();
        assert_eq!(tree.lookup(b3.into(), 3, false).unwrap().unwrap(), root3);

        // local-only never delegates
        assert_eq!(tree.lookup(b3.into(), 7, true).unwrap(), None);
        assert_eq!(tree.lookup(b2.into(), 9, false).unwrap(), None);
    }

    #[test]
    fn fork_round_trip_reads_back_the_fork_coordinate() {
        let mut tree = tree_with_root(5);
        let coord = tree.head(BranchRef::Root).unwrap();
        let b2 = tree.fork_branch(BranchRef::Root, coord).unwrap();
        let unit = tree.lookup(b2.into(), coord.height, false).unwrap().unwrap();
        assert_eq!(unit.height_hash(), coord);
    }

    #[test]
    fn fork_at_unknown_coordinate_is_refused() {
        let mut tree = tree_with_root(5);

        // height beyond the chain
        let beyond = HeightHash::new(9, UnitHash::repeat_byte(9));
        assert_matches!(
            tree.fork_branch(BranchRef::Main, beyond),
            Err(ForkTreeError::UnknownCoordinate { coord }) if coord == beyond
        );

        // right height, wrong hash
        let wrong = HeightHash::new(3, UnitHash::repeat_byte(3));
        assert_matches!(
            tree.fork_branch(BranchRef::Main, wrong),
            Err(ForkTreeError::UnknownCoordinate { .. })
        );

        assert!(tree.segment_ids().is_empty());
    }

    #[test]
    fn broken_link_does_not_mutate_the_branch() {
        let mut tree = tree_with_root(5);
        let b2 = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, b2, 2, "b2");
        let head = tree.head(b2.into()).unwrap();
        let before = tree.inserted_units;

        let stranger = mock_unit(HeightHash::new(2, UnitHash::repeat_byte(2)), "x");
        assert_matches!(
            tree.add_head(b2.into(), stranger),
            Err(ForkTreeError::BrokenLink { .. })
        );
        assert_eq!(tree.head(b2.into()).unwrap(), head);
        assert_eq!(tree.inserted_units, before);
        verify(&tree);
    }

    #[test]
    fn switch_to_unknown_segment_is_refused() {
        let mut tree = tree_with_root(3);
        assert_matches!(
            tree.switch_main_to(SegmentId::new(42)),
            Err(ForkTreeError::UnknownSegment { id }) if id == SegmentId::new(42)
        );
    }

    #[test]
    fn root_growth_invalidates_overtaken_forks_lazily() {
        let mut tree = tree_with_root(4);
        let main = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, main, 2, "m");

        // a fork attached on main's unit at height 5, above the frontier
        let at5 = tree.lookup(main.into(), 5, false).unwrap().unwrap();
        let b = tree.fork_branch(main.into(), at5.height_hash()).unwrap();
        grow(&mut tree, b, 1, "b");
        assert_eq!(tree.segment_status(b).unwrap(), SegmentStatus::Growing);

        // the finalized chain overtakes height 5 on a different unit
        tree.root_head_add(mock_unit(tree.root.head(), "r")).unwrap();
        assert_eq!(tree.root.head().height, 5);

        // main still attaches below the new frontier; b is irreconcilable
        assert_eq!(tree.segment_status(main).unwrap(), SegmentStatus::Growing);
        assert_eq!(tree.segment_status(b).unwrap(), SegmentStatus::Unreachable);
        let head = tree.head(b.into()).unwrap();
        assert_matches!(
            tree.add_head(b.into(), mock_unit(head, "b")),
            Err(ForkTreeError::UnreachableSegment { .. })
        );
        assert_matches!(
            tree.switch_main_to(b),
            Err(ForkTreeError::UnreachableSegment { .. })
        );
        invariants::check_size(&tree).unwrap();
        invariants::check_acyclic(&tree).unwrap();
    }

    #[test]
    fn prune_unreachable_cascades_through_descendants() {
        let mut tree = tree_with_root(4);
        let main = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, main, 2, "m");

        let at5 = tree.lookup(main.into(), 5, false).unwrap().unwrap();
        let b = tree.fork_branch(main.into(), at5.height_hash()).unwrap();
        grow(&mut tree, b, 1, "b");
        let at6 = tree.lookup(b.into(), 6, false).unwrap().unwrap();
        let c = tree.fork_branch(b.into(), at6.height_hash()).unwrap();
        grow(&mut tree, c, 1, "c");

        tree.root_head_add(mock_unit(tree.root.head(), "r")).unwrap();

        let removed = tree.prune_unreachable().unwrap();
        assert_eq!(removed, vec![b, c]);
        assert_eq!(tree.segment_ids(), vec![main]);
        verify(&tree);

        // nothing left to prune
        assert!(tree.prune_unreachable().unwrap().is_empty());
    }

    #[test]
    fn pruning_the_main_segment_truncates_to_root() {
        let mut tree = tree_with_root(4);
        let main = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, main, 1, "m");
        let at5 = tree.lookup(main.into(), 5, false).unwrap().unwrap();
        let b = tree.fork_branch(main.into(), at5.height_hash()).unwrap();
        tree.switch_main_to(b).unwrap();

        tree.root_head_add(mock_unit(tree.root.head(), "r")).unwrap();
        let removed = tree.prune_unreachable().unwrap();
        assert_eq!(removed, vec![b]);
        assert_eq!(tree.main(), None);
        assert_eq!(tree.main_head(), tree.root.head());
        verify(&tree);
    }

    #[test]
    fn resolution_depth_bound_is_reported_as_cyclic() {
        let root = RootSegment::open(
            MemoryStore::with_chain(1, "root"),
            HeightHash::default(),
        )
        .unwrap();
        let mut tree = ForkTree::new(root, ForkTreeConfig::new(2));

        // nest forks three levels deep, each attached above the frontier;
        // the first two levels resolve within the bound
        let a = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        grow(&mut tree, a, 2, "a");
        let b = tree.fork_branch(a.into(), tree.head(a.into()).unwrap()).unwrap();
        grow(&mut tree, b, 2, "b");
        let deepest = tree.fork_branch(b.into(), tree.head(b.into()).unwrap()).unwrap();

        assert_matches!(
            tree.switch_main_to(deepest),
            Err(ForkTreeError::CyclicResolution { start, .. }) if start == deepest
        );
        assert_matches!(
            invariants::check_acyclic(&tree),
            Err(ForkTreeError::CyclicResolution { .. })
        );
    }
}

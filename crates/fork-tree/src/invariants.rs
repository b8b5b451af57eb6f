//! Read-only structural soundness checks over a [`ForkTree`].
//!
//! These traversals never mutate the tree. They are not part of normal
//! control flow: the owning subsystem runs them as a sanity gate after
//! mutations in debug/verification builds, and a failure indicates an
//! internal bookkeeping defect rather than bad input.

use crate::ForkTree;
use trellis_interfaces::{
    fork_tree::Branch, store::FinalizedStore, ForkTreeError, ForkTreeResult,
};

/// Checks the linkage of the whole tree.
///
/// Every segment's own run must be gap-free, strictly increasing and
/// correctly linked; every tail must resolve in an immediate ancestor; main,
/// when set, must resolve down to the root with no missing hop. There is
/// exactly one root by construction.
///
/// A tail overtaken by root growth on a conflicting unit is a legal
/// (unreachable, prunable) state, not a structural defect; only a tail
/// dangling *above* the finalized frontier with no owner is flagged.
pub fn check_structure<S: FinalizedStore>(tree: &ForkTree<S>) -> ForkTreeResult<()> {
    for id in tree.segment_ids() {
        let segment = &tree.segments[&id];

        let mut prev = segment.tail_coord();
        for unit in segment.units() {
            if unit.height != prev.height + 1 || !unit.extends(prev) {
                return Err(ForkTreeError::Inconsistent(format!(
                    "segment {id} run breaks at height {}: unit {} does not extend {prev}",
                    unit.height,
                    unit.height_hash(),
                )))
            }
            prev = unit.height_hash();
        }
        if segment.head() != prev {
            return Err(ForkTreeError::Inconsistent(format!(
                "segment {id} head {} does not match its run, expected {prev}",
                segment.head(),
            )))
        }

        let tail = segment.tail_coord();
        if tail.height > tree.root.head().height && tree.segment_owner(tail, id).is_none() {
            return Err(ForkTreeError::Inconsistent(format!(
                "segment {id} tail {tail} dangles above the finalized frontier",
            )))
        }
    }

    if let Some(main) = tree.main() {
        tree.resolve_to_root(main)?;
    }
    Ok(())
}

/// Checks that no unit was silently lost or duplicated.
///
/// The sum of every segment's own unit count plus the root's unit count must
/// equal the running insertion counter maintained by the tree.
pub fn check_size<S: FinalizedStore>(tree: &ForkTree<S>) -> ForkTreeResult<()> {
    let stored =
        tree.root.len() + tree.segments.values().map(|segment| segment.len()).sum::<u64>();
    if stored != tree.inserted_units {
        return Err(ForkTreeError::Inconsistent(format!(
            "tree stores {stored} units but accepted {}",
            tree.inserted_units,
        )))
    }
    Ok(())
}

/// Checks that the registered segments form a tree.
///
/// Performs the same downward resolution walk the tree uses when switching
/// main, over *every* registered segment, and fails with
/// [`ForkTreeError::CyclicResolution`] if any walk revisits a segment before
/// reaching the root. A walk that terminates at an irreconcilable tail is
/// not a cycle and passes.
pub fn check_acyclic<S: FinalizedStore>(tree: &ForkTree<S>) -> ForkTreeResult<()> {
    for id in tree.segment_ids() {
        match tree.resolve_to_root(id) {
            Ok(_) | Err(ForkTreeError::UnreachableSegment { .. }) => {}
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

//! Wrapper around the [`ForkTree`] that can be shared across the node.

use crate::{invariants, ForkTree, TreeSnapshot};
use parking_lot::RwLock;
use trellis_interfaces::{
    fork_tree::{
        BranchRef, ForkTreeEngine, ForkTreeViewer, SegmentStatus, SwitchOutcome,
    },
    store::FinalizedStore,
    ForkTreeResult,
};
use trellis_primitives::{ChainInfo, Height, HeightHash, SegmentId, Unit};

/// Shareable fork tree, behind a read-write lock.
///
/// Every mutation holds the exclusive lock for its full duration and every
/// query takes the shared lock, so concurrent readers always observe a
/// structurally consistent tree and never a half-applied switch.
#[derive(Debug)]
pub struct ShareableForkTree<S> {
    /// The fork tree.
    tree: RwLock<ForkTree<S>>,
}

impl<S> ShareableForkTree<S> {
    /// Wraps the tree.
    pub fn new(tree: ForkTree<S>) -> Self {
        Self { tree: RwLock::new(tree) }
    }
}

impl<S: FinalizedStore> ShareableForkTree<S> {
    /// Export a serializable snapshot of the tree.
    pub fn snapshot(&self) -> TreeSnapshot {
        self.tree.read().snapshot()
    }

    /// Run every invariant checker against a frozen view of the tree.
    ///
    /// Intended as a sanity gate after mutations in debug/verification
    /// builds; a failure indicates an internal defect, not bad input.
    pub fn verify(&self) -> ForkTreeResult<()> {
        let tree = self.tree.read();
        invariants::check_structure(&tree)?;
        invariants::check_size(&tree)?;
        invariants::check_acyclic(&tree)?;
        Ok(())
    }
}

impl<S: FinalizedStore> ForkTreeEngine for ShareableForkTree<S> {
    fn fork_branch(&self, parent: BranchRef, coord: HeightHash) -> ForkTreeResult<SegmentId> {
        self.tree.write().fork_branch(parent, coord)
    }

    fn add_head(&self, branch: BranchRef, unit: Unit) -> ForkTreeResult<HeightHash> {
        self.tree.write().add_head(branch, unit)
    }

    fn root_head_add(&self, unit: Unit) -> ForkTreeResult<HeightHash> {
        self.tree.write().root_head_add(unit)
    }

    fn switch_main_to(&self, target: SegmentId) -> ForkTreeResult<SwitchOutcome> {
        self.tree.write().switch_main_to(target)
    }

    fn switch_main_to_empty(&self) -> SwitchOutcome {
        self.tree.write().switch_main_to_empty()
    }

    fn prune_unreachable(&self) -> ForkTreeResult<Vec<SegmentId>> {
        self.tree.write().prune_unreachable()
    }
}

impl<S: FinalizedStore> ForkTreeViewer for ShareableForkTree<S> {
    fn main(&self) -> Option<SegmentId> {
        self.tree.read().main()
    }

    fn main_head(&self) -> HeightHash {
        self.tree.read().main_head()
    }

    fn chain_info(&self) -> ChainInfo {
        self.tree.read().chain_info()
    }

    fn head(&self, branch: BranchRef) -> ForkTreeResult<HeightHash> {
        self.tree.read().head(branch)
    }

    fn lookup(
        &self,
        branch: BranchRef,
        height: Height,
        local_only: bool,
    ) -> ForkTreeResult<Option<Unit>> {
        self.tree.read().lookup(branch, height, local_only)
    }

    fn segment_status(&self, id: SegmentId) -> ForkTreeResult<SegmentStatus> {
        self.tree.read().segment_status(id)
    }

    fn segment_ids(&self) -> Vec<SegmentId> {
        self.tree.read().segment_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForkTreeConfig, RootSegment};
    use trellis_interfaces::test_utils::{mock_unit, MemoryStore};

    fn shareable(root_height: u64) -> ShareableForkTree<MemoryStore> {
        let root = RootSegment::open(
            MemoryStore::with_chain(root_height, "root"),
            HeightHash::default(),
        )
        .unwrap();
        ShareableForkTree::new(ForkTree::new(root, ForkTreeConfig::default()))
    }

    #[test]
    fn engine_and_viewer_work_through_trait_objects() {
        let tree = shareable(3);
        let engine: &dyn ForkTreeEngine = &tree;
        let viewer: &dyn ForkTreeViewer = &tree;

        let head = viewer.main_head();
        let id = engine.fork_branch(BranchRef::Main, head).unwrap();
        engine.add_head(BranchRef::Segment(id), mock_unit(head, "fork")).unwrap();
        engine.switch_main_to(id).unwrap();

        assert_eq!(viewer.main(), Some(id));
        assert_eq!(viewer.main_head().height, 4);
        assert_eq!(viewer.chain_info().best_height, 4);
        assert!(viewer.contains(id));
        assert_eq!(viewer.segment_status(id).unwrap(), SegmentStatus::Canonical);
        tree.verify().unwrap();
    }

    #[test]
    fn readers_never_observe_a_half_applied_switch() {
        let tree = shareable(3);
        std::thread::scope(|scope| {
            let tree = &tree;
            scope.spawn(move || {
                for _ in 0..32 {
                    let head = tree.main_head();
                    let id = tree.fork_branch(BranchRef::Main, head).unwrap();
                    tree.add_head(BranchRef::Segment(id), mock_unit(head, "writer"))
                        .unwrap();
                    tree.switch_main_to(id).unwrap();
                }
            });
            // every snapshot a reader takes, mid-churn, is fully consistent
            for _ in 0..64 {
                tree.verify().unwrap();
                let _ = tree.snapshot();
            }
        });
        assert_eq!(tree.main_head().height, 35);
    }
}

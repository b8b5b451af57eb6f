//! Serializable tree export for logging and inspection.

use crate::ForkTree;
use serde::Serialize;
use trellis_interfaces::{fork_tree::Branch, store::FinalizedStore};
use trellis_primitives::{HeightHash, SegmentId};

/// Point-in-time view of a [`ForkTree`].
///
/// The exact shape is a diagnostic aid, not a compatibility surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TreeSnapshot {
    /// Genesis coordinate of the root segment.
    pub genesis: HeightHash,
    /// Head of the root segment.
    pub root_head: HeightHash,
    /// The currently flagged main segment, if any.
    pub main: Option<SegmentId>,
    /// Running count of units accepted by the tree.
    pub inserted_units: u64,
    /// Registered segments in ascending id order.
    pub segments: Vec<SegmentSnapshot>,
}

/// One registered segment in a [`TreeSnapshot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SegmentSnapshot {
    /// Registry id.
    pub id: SegmentId,
    /// Attachment coordinate.
    pub tail: HeightHash,
    /// Coordinate of the most recent owned unit.
    pub head: HeightHash,
    /// Number of owned units.
    pub units: u64,
}

impl<S: FinalizedStore> ForkTree<S> {
    /// Export a serializable snapshot of the tree.
    pub fn snapshot(&self) -> TreeSnapshot {
        let mut segments: Vec<_> = self
            .segments
            .values()
            .map(|segment| SegmentSnapshot {
                id: segment.id(),
                tail: segment.tail_coord(),
                head: segment.head(),
                units: segment.len(),
            })
            .collect();
        segments.sort_unstable_by_key(|segment| segment.id);

        TreeSnapshot {
            genesis: self.root.genesis(),
            root_head: self.root.head(),
            main: self.main(),
            inserted_units: self.inserted_units,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ForkTreeConfig, RootSegment};
    use trellis_interfaces::{
        fork_tree::BranchRef,
        test_utils::{mock_unit, MemoryStore},
    };

    #[test]
    fn snapshot_reflects_the_tree() {
        let root = RootSegment::open(
            MemoryStore::with_chain(5, "root"),
            HeightHash::default(),
        )
        .unwrap();
        let mut tree = ForkTree::new(root, ForkTreeConfig::default());
        let b2 = tree.fork_branch(BranchRef::Main, tree.main_head()).unwrap();
        let head = tree.head(b2.into()).unwrap();
        tree.add_head(b2.into(), mock_unit(head, "b2")).unwrap();
        tree.switch_main_to(b2).unwrap();

        let snapshot = tree.snapshot();
        assert_eq!(snapshot.root_head.height, 5);
        assert_eq!(snapshot.main, Some(b2));
        assert_eq!(snapshot.inserted_units, 6);
        assert_eq!(snapshot.segments.len(), 1);
        assert_eq!(snapshot.segments[0].tail, head);
        assert_eq!(snapshot.segments[0].units, 1);

        // serializes for log output
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"root_head\""));
        assert!(json.contains("\"segments\""));

        // a snapshot is a frozen view: repeating it without mutation yields
        // the same value
        assert_eq!(tree.snapshot(), snapshot);
    }
}

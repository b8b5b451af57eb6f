use std::collections::BTreeMap;
use trellis_interfaces::{
    fork_tree::Branch,
    store::FinalizedStore,
    ForkTreeError, ForkTreeResult, StoreError,
};
use trellis_primitives::{Height, HeightHash, Unit};

/// The finalized, append-only prefix shared by all forks.
///
/// The root has no attachment coordinate of its own: it owns every unit from
/// the genesis coordinate upward. It grows only by direct append and is never
/// forked away from below its own head.
///
/// Durable history lives in the [`FinalizedStore`] the root is opened over;
/// units appended through the tree are kept in memory as well, so lookups
/// only reach the store for heights finalized before the tree was built.
#[derive(Debug)]
pub struct RootSegment<S> {
    /// Sentinel coordinate below the first owned unit.
    genesis: HeightHash,
    /// Coordinate of the most recent finalized unit.
    head: HeightHash,
    /// Units appended through the tree; earlier history answers from the
    /// store.
    units: BTreeMap<Height, Unit>,
    store: S,
}

impl<S: FinalizedStore> RootSegment<S> {
    /// Opens the root over `store`, adopting the store's frontier as the
    /// head, or `genesis` while the store is empty.
    pub fn open(store: S, genesis: HeightHash) -> Result<Self, StoreError> {
        let head = store.frontier()?.unwrap_or(genesis);
        Ok(Self { genesis, head, units: BTreeMap::new(), store })
    }

    /// The genesis coordinate.
    pub fn genesis(&self) -> HeightHash {
        self.genesis
    }

    /// Whether `coord` is the genesis coordinate or matches the finalized
    /// unit at its height.
    pub(crate) fn owns(&self, coord: HeightHash) -> Result<bool, StoreError> {
        if coord == self.genesis {
            return Ok(true)
        }
        Ok(self.unit_at(coord.height)?.map_or(false, |unit| unit.hash == coord.hash))
    }
}

impl<S: FinalizedStore> Branch for RootSegment<S> {
    fn head(&self) -> HeightHash {
        self.head
    }

    fn tail(&self) -> Option<HeightHash> {
        None
    }

    fn len(&self) -> u64 {
        self.head.height - self.genesis.height
    }

    fn contains_height(&self, height: Height) -> bool {
        height > self.genesis.height && height <= self.head.height
    }

    fn unit_at(&self, height: Height) -> Result<Option<Unit>, StoreError> {
        if !self.contains_height(height) {
            return Ok(None)
        }
        if let Some(unit) = self.units.get(&height) {
            return Ok(Some(unit.clone()))
        }
        self.store.unit_at(height)
    }

    fn append(&mut self, unit: Unit) -> ForkTreeResult<HeightHash> {
        if !unit.extends(self.head) {
            return Err(ForkTreeError::BrokenLink {
                unit: unit.height_hash(),
                prev: unit.prev,
                head: self.head,
            })
        }
        self.store.persist(&unit)?;
        self.head = unit.height_hash();
        self.units.insert(unit.height, unit);
        Ok(self.head)
    }
}

//! Test doubles for the fork tree: an in-memory [`FinalizedStore`] and
//! deterministic unit builders.

use crate::{store::FinalizedStore, StoreError};
use std::collections::BTreeMap;
use trellis_primitives::{Height, HeightHash, Unit, UnitHash, UNIT_HASH_LENGTH};

/// Deterministic unit extending `head`.
///
/// The hash mixes the new height, the parent hash and `tag`, so competing
/// branches built with different tags produce distinct hashes at the same
/// height, while rebuilding the same chain yields the same hashes.
pub fn mock_unit(head: HeightHash, tag: &str) -> Unit {
    let height = head.height + 1;
    let mut bytes = *head.hash.as_bytes();
    for (i, b) in height.to_be_bytes().iter().enumerate() {
        bytes[i] ^= b;
    }
    for (i, b) in tag.bytes().enumerate() {
        bytes[(8 + i) % UNIT_HASH_LENGTH] ^= b;
    }
    Unit::new(UnitHash::from(bytes), head)
}

/// Builds `n` units chained on top of `head` with [`mock_unit`].
pub fn mock_chain(head: HeightHash, n: u64, tag: &str) -> Vec<Unit> {
    let mut units = Vec::with_capacity(n as usize);
    let mut head = head;
    for _ in 0..n {
        let unit = mock_unit(head, tag);
        head = unit.height_hash();
        units.push(unit);
    }
    units
}

/// In-memory [`FinalizedStore`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    units: BTreeMap<Height, Unit>,
    genesis: HeightHash,
}

impl MemoryStore {
    /// Creates an empty store with the default genesis coordinate
    /// `(0, UnitHash::ZERO)`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with `n` finalized units chained from the
    /// default genesis coordinate.
    pub fn with_chain(n: u64, tag: &str) -> Self {
        let mut store = Self::new();
        for unit in mock_chain(HeightHash::default(), n, tag) {
            store.persist(&unit).expect("seed units are contiguous");
        }
        store
    }
}

impl FinalizedStore for MemoryStore {
    fn unit_at(&self, height: Height) -> Result<Option<Unit>, StoreError> {
        Ok(self.units.get(&height).cloned())
    }

    fn frontier(&self) -> Result<Option<HeightHash>, StoreError> {
        Ok(self.units.last_key_value().map(|(_, unit)| unit.height_hash()))
    }

    fn persist(&mut self, unit: &Unit) -> Result<(), StoreError> {
        let frontier = self.frontier()?.unwrap_or(self.genesis);
        if !unit.extends(frontier) {
            return Err(StoreError::NonContiguous {
                height: unit.height,
                frontier: frontier.height,
            })
        }
        self.units.insert(unit.height, unit.clone());
        Ok(())
    }
}

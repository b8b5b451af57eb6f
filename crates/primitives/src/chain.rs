use crate::{Height, UnitHash};

/// Current status of the canonical chain's head.
#[derive(Default, Clone, Debug, Eq, PartialEq)]
pub struct ChainInfo {
    /// The hash of the canonical head unit.
    pub best_hash: UnitHash,
    /// The height of the canonical head unit.
    pub best_height: Height,
}

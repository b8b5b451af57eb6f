use crate::Height;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a [`UnitHash`] in bytes.
pub const UNIT_HASH_LENGTH: usize = 32;

/// Fixed-size content identifier of a [`Unit`].
///
/// Hashes are opaque to the engine: equality is the only operation it relies
/// on. Producing and verifying them is the caller's concern.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitHash(pub [u8; UNIT_HASH_LENGTH]);

impl UnitHash {
    /// The all-zero hash, used as the hash component of the genesis
    /// coordinate.
    pub const ZERO: Self = Self([0; UNIT_HASH_LENGTH]);

    /// Create a hash with every byte set to `byte`.
    pub const fn repeat_byte(byte: u8) -> Self {
        Self([byte; UNIT_HASH_LENGTH])
    }

    /// Returns the raw bytes.
    pub fn as_bytes(&self) -> &[u8; UNIT_HASH_LENGTH] {
        &self.0
    }
}

impl From<[u8; UNIT_HASH_LENGTH]> for UnitHash {
    fn from(bytes: [u8; UNIT_HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for UnitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for UnitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // abbreviated form for logs
        write!(
            f,
            "0x{}..{}",
            hex::encode(&self.0[..2]),
            hex::encode(&self.0[UNIT_HASH_LENGTH - 2..])
        )
    }
}

/// A unit height and hash, the coordinate every tail, head and lookup is
/// expressed in.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HeightHash {
    /// The height of the unit.
    pub height: Height,
    /// The hash of the unit.
    pub hash: UnitHash,
}

impl HeightHash {
    /// Creates a new `HeightHash` coordinate.
    pub const fn new(height: Height, hash: UnitHash) -> Self {
        Self { height, hash }
    }
}

impl From<(Height, UnitHash)> for HeightHash {
    fn from((height, hash): (Height, UnitHash)) -> Self {
        Self { height, hash }
    }
}

impl fmt::Debug for HeightHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeightHash")
            .field("height", &self.height)
            .field("hash", &self.hash)
            .finish()
    }
}

impl fmt::Display for HeightHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.height, self.hash)
    }
}

/// The atomic chain element: a position, a content identifier, and the
/// declared coordinate it extends.
///
/// Units are immutable once created. Two units are the same logical block iff
/// their hashes are equal; the height is declared by the producer and is only
/// trusted after the predecessor link has been checked on append, so
/// `prev.height + 1 == height` holds throughout any accepted run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Position of the unit in its chain.
    pub height: Height,
    /// Content identifier, unique within a consistent chain.
    pub hash: UnitHash,
    /// Coordinate of the unit this one extends.
    pub prev: HeightHash,
}

impl Unit {
    /// Creates a unit extending `prev`, one height above it.
    pub fn new(hash: UnitHash, prev: HeightHash) -> Self {
        Self { height: prev.height + 1, hash, prev }
    }

    /// The unit's own coordinate.
    pub fn height_hash(&self) -> HeightHash {
        HeightHash::new(self.height, self.hash)
    }

    /// Whether this unit directly extends the given head coordinate.
    ///
    /// The declared height must sit exactly one above the head, so a run
    /// built from accepted units can never contain a gap even if the
    /// producer declared an inconsistent height.
    pub fn extends(&self, head: HeightHash) -> bool {
        self.prev == head && self.height == head.height + 1
    }
}

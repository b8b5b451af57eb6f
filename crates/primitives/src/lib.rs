#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Commonly used types for the trellis fork-resolution engine.
//!
//! This crate contains the plain data shared by every other crate: the chain
//! [`Unit`], the [`HeightHash`] coordinate it is addressed by, and segment
//! identifiers.

mod chain;
mod segment;
mod unit;

pub use chain::ChainInfo;
pub use segment::SegmentId;
pub use unit::{HeightHash, Unit, UnitHash, UNIT_HASH_LENGTH};

/// A unit height in the chain.
pub type Height = u64;

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Traits and error types at the seams of the trellis fork-resolution engine.
//!
//! The engine implementation lives in `trellis-fork-tree`; this crate defines
//! the surfaces it is consumed and backed through:
//!
//! * [`fork_tree::ForkTreeEngine`] and [`fork_tree::ForkTreeViewer`], the
//!   mutating and read-only halves of the tree.
//! * [`fork_tree::Branch`], the contract shared by the root segment and
//!   forked segments.
//! * [`store::FinalizedStore`], the finalized-chain dependency the root
//!   segment is backed by.

/// Fork tree traits and outcome types.
pub mod fork_tree;

/// The finalized-chain store the tree's root segment is backed by.
pub mod store;

/// Common test helpers for the fork tree: an in-memory finalized store and
/// deterministic unit builders.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use fork_tree::error::{ForkTreeError, StoreError};

/// Result alias for fallible fork tree operations.
pub type ForkTreeResult<T> = std::result::Result<T, ForkTreeError>;

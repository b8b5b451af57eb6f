#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]

//! Branch-tree fork resolution for the trellis node.
//!
//! The [`ForkTree`] tracks competing candidate chains ("segments") rooted in
//! a single finalized prefix and atomically switches which of them is
//! considered canonical when the consensus layer reports a better chain.
//!
//! Main structures:
//!
//! * [`ForkTree`]: the tree itself, owning the root segment and the segment
//!   registry; the sole authority on structural validity.
//! * [`Segment`]: one candidate chain extension, a gap-free run of units
//!   above a fixed attachment coordinate.
//! * [`RootSegment`]: the finalized, append-only prefix shared by all forks,
//!   backed by a [`FinalizedStore`](trellis_interfaces::store::FinalizedStore).
//! * [`ShareableForkTree`]: the tree behind a read-write lock, exposing the
//!   [`ForkTreeEngine`](trellis_interfaces::fork_tree::ForkTreeEngine) and
//!   [`ForkTreeViewer`](trellis_interfaces::fork_tree::ForkTreeViewer)
//!   traits.
//! * [`invariants`]: read-only structural soundness checks, intended for
//!   tests and debug verification after mutations.

mod config;
mod fork_tree;
pub mod invariants;
mod root;
mod segment;
mod shareable;
mod snapshot;

pub use crate::fork_tree::ForkTree;
pub use config::ForkTreeConfig;
pub use root::RootSegment;
pub use segment::Segment;
pub use shareable::ShareableForkTree;
pub use snapshot::{SegmentSnapshot, TreeSnapshot};

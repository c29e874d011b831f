//! Flora: trees placed deterministically along the terrain, and the leaves
//! that fall from them.
//!
//! # Invariants
//! - Whether a tree stands at a slot is a pure function of `(x, seed)`.
//! - A trunk height, once chosen for a root x, is reused for the rest of the
//!   session even after the trunk blocks were evicted.
//! - Each leaf's state is mutated only by its own timer and collision
//!   handling.

mod builder;
mod leaf;
mod placer;

pub use builder::{CANOPY_BLOCKS, LEAF_DENSITY, TreeBuilder, TrunkCache};
pub use leaf::{LeafLifecycle, LeafState, LeafTask, LeafTimings};
pub use placer::{TREE_GAP_BLOCKS, TreePlacer};

pub fn crate_info() -> &'static str {
    "sidescape-flora v0.1.0"
}

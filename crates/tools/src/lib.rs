//! Developer Tooling: read-only views of a running world.
//!
//! # Invariants
//! - Tools never mutate the world they inspect.

mod inspector;

pub use inspector::{EntityInfo, LeafCensus, WorldInspector, WorldSummary};

pub fn crate_info() -> &'static str {
    "sidescape-tools v0.1.0"
}

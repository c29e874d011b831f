//! Shared value types for the side-scrolling world generator.
//!
//! # Invariants
//! - Entity ids are allocated monotonically by the registry, never reused.
//! - Every coordinate handed out by [`BlockGrid`] rounding is a multiple of
//!   the block size.

pub mod config;
pub mod grid;
pub mod hash;
pub mod types;

pub use config::{ConfigError, WindowSize, WorldConfig};
pub use grid::{BLOCK_SIZE, BlockGrid};
pub use hash::{mix_position, splitmix64};
pub use types::{EntityId, Layer, MaterialId, Rgb, Tag, Transform};

pub fn crate_info() -> &'static str {
    "sidescape-common v0.1.0"
}

//! Terrain: the height field and the ground blocks materialized from it.
//!
//! # Invariants
//! - [`HeightMap::ground_height_at`] is a pure function of `(x, seed,
//!   window)`: the same x yields the same height for the whole session,
//!   including after its columns were evicted and streamed in again.
//! - Every height is a multiple of the block size and lies within
//!   `[0, window height]`.

mod ground;
mod height;
pub mod noise;

pub use ground::{GroundStreamer, OVERFILL};
pub use height::{HeightMap, TERRAIN_GRADIENT};

pub fn crate_info() -> &'static str {
    "sidescape-terrain v0.1.0"
}

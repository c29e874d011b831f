//! Streaming: keeps a fixed-width window of generated world around a
//! moving viewpoint, and the frame loop that drives it.
//!
//! # Invariants
//! - Within one update, extension runs before eviction, so freshly
//!   generated content is never evicted against stale bounds.
//! - The retained range always reaches at least one viewport width past
//!   the viewpoint on both sides.
//! - Ground columns and tree slots present in the world are exactly those
//!   inside the closed range; extending never overlaps what is retained.

mod session;
mod stats;
mod streamer;

pub use session::{Session, SessionError};
pub use stats::{FrameTimer, StreamStats};
pub use streamer::{WorldRange, WorldStreamer};

pub fn crate_info() -> &'static str {
    "sidescape-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}

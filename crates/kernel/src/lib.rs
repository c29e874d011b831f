//! World Kernel: the host facilities the generator runs on.
//!
//! Provides an object registry with layers and tags, a time-based task
//! scheduler, a smooth-interpolation animation primitive and a minimal
//! kinematics step that reports collision-enter events.
//!
//! # Invariants
//! - Everything runs on the caller's thread, driven by explicit `advance` /
//!   `step` calls. Nothing here blocks or spawns threads.
//! - All state mutations flow through explicit operations and iteration
//!   order is deterministic (BTreeMap keyed by monotonic ids).

pub mod animate;
mod broadphase;
pub mod physics;
pub mod schedule;
pub mod world;

pub use animate::{AnimationId, Animator, Easing, Property, Repeat, Transition};
pub use physics::{CollisionEnter, Physics};
pub use schedule::{Fired, Scheduler, TaskId};
pub use world::{Appearance, Body, EntityData, World, WorldEvent};

pub fn crate_info() -> &'static str {
    "sidescape-kernel v0.1.0"
}

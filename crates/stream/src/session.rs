use glam::Vec2;
use sidescape_assets::{AssetError, GROUND, LEAF, MaterialTable, TRUNK};
use sidescape_common::{ConfigError, Layer, Tag, WorldConfig};
use sidescape_flora::{LeafLifecycle, TreeBuilder, TreePlacer};
use sidescape_kernel::{Animator, Physics, World, WorldEvent};
use sidescape_terrain::{GroundStreamer, HeightMap};
use std::time::Instant;

use crate::stats::{FrameTimer, StreamStats};
use crate::streamer::WorldStreamer;

/// Errors from building a [`Session`].
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("material table: {0}")]
    Asset(#[from] AssetError),
}

/// A running world: the host facilities plus every generator, advanced one
/// frame at a time.
#[derive(Debug)]
pub struct Session {
    config: WorldConfig,
    world: World,
    animator: Animator,
    physics: Physics,
    leaves: LeafLifecycle,
    streamer: WorldStreamer,
    timer: FrameTimer,
    landed: u64,
}

impl Session {
    /// Validate `config`, wire up the generators and populate the initial
    /// range.
    pub fn new(config: WorldConfig, materials: &MaterialTable) -> Result<Self, SessionError> {
        config.validate()?;
        let heights = HeightMap::new(&config);
        let ground = GroundStreamer::new(heights, materials.swatch(GROUND)?);
        let builder = TreeBuilder::new(heights, materials.swatch(TRUNK)?, materials.swatch(LEAF)?);

        let mut physics = Physics::new();
        physics.set_layers_collide(Layer::Foliage, Layer::Terrain, true);

        let mut session = Self {
            config,
            world: World::new(),
            animator: Animator::new(),
            physics,
            leaves: LeafLifecycle::new(config.seed),
            streamer: WorldStreamer::new(ground, TreePlacer::new(builder)),
            timer: FrameTimer::default(),
            landed: 0,
        };
        session
            .streamer
            .populate_initial(&mut session.world, &mut session.animator, &mut session.leaves);
        session.world.drain_events();
        tracing::info!(seed = config.seed, entities = session.world.entity_count(), "session ready");
        Ok(session)
    }

    /// Run one frame with the viewpoint at `viewpoint_x`: streaming, leaf
    /// timers, animations, physics, collision dispatch, then the world
    /// tick.
    pub fn tick(&mut self, viewpoint_x: f32, dt: f32) -> StreamStats {
        let started = Instant::now();
        let mut stats = self
            .streamer
            .update(viewpoint_x, &mut self.world, &mut self.animator, &mut self.leaves);

        self.leaves.advance(dt, &mut self.world, &mut self.animator);
        self.animator.advance(dt, &mut self.world);
        for hit in self.physics.step(&mut self.world, dt) {
            let is_leaf = self.world.get(hit.entity).is_some_and(|e| e.tag == Tag::Leaf);
            if is_leaf && self.leaves.on_collision(&hit, &mut self.animator) {
                self.landed += 1;
            }
        }
        self.world.step();

        let churn = self
            .world
            .drain_events()
            .iter()
            .filter(|e| !matches!(e, WorldEvent::Stepped { .. }))
            .count();
        stats.frame_time = started.elapsed();
        self.timer.record(stats.frame_time);
        tracing::trace!(
            tick = self.world.tick(),
            churn,
            live = stats.live_entities,
            "frame complete"
        );
        stats
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn leaves(&self) -> &LeafLifecycle {
        &self.leaves
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn streamer(&self) -> &WorldStreamer {
        &self.streamer
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Leaves that have touched down since the session started.
    pub fn landed(&self) -> u64 {
        self.landed
    }

    pub fn ground_height_at(&self, x: f32) -> f32 {
        self.streamer.ground().heights().ground_height_at(x)
    }

    /// Top-left corner for an avatar of `size` standing on the spawn
    /// column.
    pub fn spawn_point(&self, size: f32) -> Vec2 {
        let x = self.config.window.midpoint_x() - size * 0.5;
        Vec2::new(x, self.ground_height_at(x) - size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidescape_common::WindowSize;
    use sidescape_flora::LeafState;

    fn session(seed: i64) -> Session {
        Session::new(WorldConfig::new(seed, WindowSize::new(800.0, 600.0)), &MaterialTable::standard()).unwrap()
    }

    #[test]
    fn rejects_bad_window() {
        let config = WorldConfig::new(1, WindowSize::new(0.0, 600.0));
        let err = Session::new(config, &MaterialTable::standard()).unwrap_err();
        assert!(matches!(err, SessionError::Config(ConfigError::InvalidWindow { .. })));
    }

    #[test]
    fn rejects_incomplete_palette() {
        let err = Session::new(WorldConfig::default(), &MaterialTable::new()).unwrap_err();
        assert!(matches!(err, SessionError::Asset(AssetError::UnknownMaterial(_))));
    }

    #[test]
    fn new_session_is_populated() {
        let s = session(1000);
        assert!(s.world().count_tagged(Tag::Ground) > 0);
        assert_eq!(s.leaves().len(), s.world().count_tagged(Tag::Leaf));
        assert!(s.world().events().is_empty());
        assert_eq!(s.ground_height_at(400.0), 300.0);
    }

    #[test]
    fn ticks_advance_world_and_timer() {
        let mut s = session(1000);
        for _ in 0..10 {
            s.tick(400.0, 1.0 / 60.0);
        }
        assert_eq!(s.world().tick(), 10);
        assert_eq!(s.timer().count(), 10);
        assert!(s.world().events().is_empty());
    }

    #[test]
    fn leaves_fall_and_land_over_time() {
        // a single seed may leave the first screen treeless
        let mut landed = 0;
        let mut grounded = 0;
        for seed in 1..=5 {
            let mut s = session(seed);
            // two minutes of standing still at 10 fps
            for _ in 0..1200 {
                s.tick(400.0, 0.1);
            }
            landed += s.landed();
            grounded += s.leaves().count(LeafState::OnGround);
        }
        assert!(landed > 0);
        assert!(grounded as u64 <= landed);
    }

    #[test]
    fn spawn_point_stands_on_ground() {
        let s = session(1000);
        let p = s.spawn_point(30.0);
        assert_eq!(p.x, 385.0);
        assert_eq!(p.y + 30.0, s.ground_height_at(385.0));
    }

    #[test]
    fn identical_sessions_stay_identical() {
        let run = || {
            let mut s = session(4242);
            let mut x = 400.0;
            for _ in 0..600 {
                x += 12.0;
                s.tick(x, 0.05);
            }
            s.world().state_hash()
        };
        assert_eq!(run(), run());
    }
}

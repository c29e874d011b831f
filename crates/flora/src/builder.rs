use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sidescape_assets::{DEFAULT_COLOR_DELTA, Swatch, approximate_color};
use sidescape_common::{EntityId, Layer, Tag, Transform, splitmix64};
use sidescape_kernel::{Animator, Appearance, Body, EntityData, World};
use sidescape_terrain::HeightMap;
use std::collections::HashMap;

use crate::leaf::LeafLifecycle;

/// Canopy edge length, in blocks.
pub const CANOPY_BLOCKS: usize = 5;
/// Probability that a canopy cell holds a leaf.
pub const LEAF_DENSITY: f64 = 0.9;

/// Clearance above the canopy, as a fraction of the window height.
const TOP_CLEARANCE: f32 = 1.0 / 9.0;
/// Shortest trunk relative to the tallest one that still fits.
const MIN_TRUNK_FRACTION: f32 = 0.2;
/// A trunk is never shorter than this many blocks.
const MIN_TRUNK_BLOCKS: f32 = 2.0;

const TRUNK_STREAM: u64 = 0x7472_756e_6b; // "trunk"

/// Trunk heights keyed by root x.
///
/// Entries outlive the trunk blocks: a tree streamed out and back in gets
/// the same height. Never evicted, so memory grows with the number of
/// distinct tree positions visited.
#[derive(Debug, Clone, Default)]
pub struct TrunkCache {
    heights: HashMap<i64, f32>,
}

impl TrunkCache {
    pub fn get(&self, x_root: f32) -> Option<f32> {
        self.heights.get(&key(x_root)).copied()
    }

    fn insert(&mut self, x_root: f32, height: f32) {
        self.heights.insert(key(x_root), height);
    }

    pub fn len(&self) -> usize {
        self.heights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heights.is_empty()
    }
}

fn key(x: f32) -> i64 {
    x.round() as i64
}

/// Builds trunks and canopies on top of the terrain.
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    heights: HeightMap,
    trunk: Swatch,
    leaf: Swatch,
    cache: TrunkCache,
    rng: ChaCha8Rng,
}

impl TreeBuilder {
    pub fn new(heights: HeightMap, trunk: Swatch, leaf: Swatch) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(splitmix64(heights.seed() as u64 ^ TRUNK_STREAM));
        Self {
            heights,
            trunk,
            leaf,
            cache: TrunkCache::default(),
            rng,
        }
    }

    pub fn heights(&self) -> &HeightMap {
        &self.heights
    }

    pub fn trunk_cache(&self) -> &TrunkCache {
        &self.cache
    }

    pub fn canopy_size(&self) -> f32 {
        CANOPY_BLOCKS as f32 * self.heights.grid().size()
    }

    /// Distance from the window top that the trunk top must stay below:
    /// room for the canopy plus a clearance of a ninth of the window.
    pub fn top_reserve(&self) -> f32 {
        let grid = self.heights.grid();
        grid.round_up(self.heights.window().height * TOP_CLEARANCE) + self.canopy_size()
    }

    /// The trunk height chosen for `x_root`, if a trunk was ever built
    /// there.
    pub fn cached_trunk_height(&self, x_root: f32) -> Option<f32> {
        self.cache.get(x_root)
    }

    fn trunk_height(&mut self, x_root: f32, ground: f32) -> f32 {
        if let Some(height) = self.cache.get(x_root) {
            return height;
        }
        let grid = self.heights.grid();
        let max = ground - self.top_reserve();
        let min = max * MIN_TRUNK_FRACTION;
        let drawn = if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        };
        let height = grid.round_down(drawn).max(MIN_TRUNK_BLOCKS * grid.size());
        self.cache.insert(x_root, height);
        height
    }

    /// Spawn the trunk column rooted at `x_root` and return the top-left of
    /// its topmost block, where the canopy attaches.
    pub fn create_trunk(&mut self, world: &mut World, x_root: f32) -> Vec2 {
        let block = self.heights.grid().size();
        let ground = self.heights.ground_height_at(x_root);
        let height = self.trunk_height(x_root, ground);
        let rows = (height / block).round() as i32;

        for i in 1..rows - 1 {
            self.spawn_trunk_block(world, Vec2::new(x_root, ground - i as f32 * block));
        }
        let top = Vec2::new(x_root, ground - height + block);
        self.spawn_trunk_block(world, top);
        tracing::trace!(x_root, height, "trunk built");
        top
    }

    fn spawn_trunk_block(&mut self, world: &mut World, position: Vec2) -> EntityId {
        let block = self.heights.grid().size();
        let color = approximate_color(self.trunk.base_color, DEFAULT_COLOR_DELTA, &mut self.rng);
        world.spawn(EntityData {
            tag: Tag::Trunk,
            layer: Layer::Trunks,
            transform: Transform::square(position, block),
            appearance: Appearance::opaque(self.trunk.material, color),
            body: Some(Body::immovable()),
        })
    }

    /// Spawn a canopy of leaves above the trunk top at `trunk_top` and hand
    /// each leaf to the lifecycle. Cells are skipped at random, so a canopy
    /// holds at most `CANOPY_BLOCKS²` leaves.
    pub fn create_tree_top(
        &mut self,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
        trunk_top: Vec2,
    ) -> Vec<EntityId> {
        let block = self.heights.grid().size();
        let left = trunk_top.x - (self.canopy_size() - block) / 2.0;
        let mut spawned = Vec::new();
        for row in 1..=CANOPY_BLOCKS {
            for col in 0..CANOPY_BLOCKS {
                if !self.rng.gen_bool(LEAF_DENSITY) {
                    continue;
                }
                let position = Vec2::new(left + col as f32 * block, trunk_top.y - row as f32 * block);
                let color = approximate_color(self.leaf.base_color, DEFAULT_COLOR_DELTA, &mut self.rng);
                let id = world.spawn(EntityData {
                    tag: Tag::Leaf,
                    layer: Layer::Foliage,
                    transform: Transform::square(position, block),
                    appearance: Appearance::opaque(self.leaf.material, color),
                    body: Some(Body::massless()),
                });
                leaves.adopt(world, animator, id, trunk_top.x);
                spawned.push(id);
            }
        }
        spawned
    }
}

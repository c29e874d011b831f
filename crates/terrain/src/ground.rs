use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sidescape_assets::{DEFAULT_COLOR_DELTA, Swatch, approximate_color};
use sidescape_common::{Layer, Tag, Transform, splitmix64};
use sidescape_kernel::{Appearance, Body, EntityData, World};

use crate::height::HeightMap;

/// Column depth multiplier. Columns are filled twice as deep as the
/// distance to the window bottom so neighbouring height changes never
/// expose a gap.
pub const OVERFILL: f32 = 2.0;

const COLOR_STREAM: u64 = 0x6772_6f75_6e64; // "ground"

/// Materializes vertical columns of ground blocks for a horizontal range.
///
/// Holds no world state: calling [`GroundStreamer::create_in_range`] twice
/// on overlapping ranges without evicting in between stacks duplicate
/// blocks.
#[derive(Debug, Clone)]
pub struct GroundStreamer {
    heights: HeightMap,
    swatch: Swatch,
    rng: ChaCha8Rng,
}

impl GroundStreamer {
    pub fn new(heights: HeightMap, swatch: Swatch) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(splitmix64(heights.seed() as u64 ^ COLOR_STREAM));
        Self {
            heights,
            swatch,
            rng,
        }
    }

    pub fn heights(&self) -> &HeightMap {
        &self.heights
    }

    /// Number of blocks stacked under a column whose surface is at `top`.
    pub fn column_depth(&self, top: f32) -> usize {
        let block = self.heights.grid().size();
        let rows = (self.heights.window().height - top) / block * OVERFILL;
        rows.ceil().max(0.0) as usize
    }

    /// Fill every column of `[min_x, max_x)` with ground blocks, from the
    /// surface downward. The range is rounded outward to whole blocks;
    /// an empty or inverted range creates nothing. Returns the number of
    /// blocks spawned.
    pub fn create_in_range(&mut self, world: &mut World, min_x: f32, max_x: f32) -> usize {
        let grid = self.heights.grid();
        let Some((min_x, max_x)) = grid.outward(min_x, max_x) else {
            return 0;
        };
        let _span = tracing::debug_span!("ground_range", min_x, max_x).entered();
        let block = grid.size();
        let mut spawned = 0;
        for x in grid.columns(min_x, max_x) {
            let top = self.heights.ground_height_at(x);
            for row in 0..self.column_depth(top) {
                let position = Vec2::new(x, top + row as f32 * block);
                let color = approximate_color(self.swatch.base_color, DEFAULT_COLOR_DELTA, &mut self.rng);
                world.spawn(EntityData {
                    tag: Tag::Ground,
                    layer: Layer::Terrain,
                    transform: Transform::square(position, block),
                    appearance: Appearance::opaque(self.swatch.material, color),
                    body: Some(Body::immovable()),
                });
                spawned += 1;
            }
        }
        tracing::debug!(spawned, "ground columns created");
        spawned
    }
}

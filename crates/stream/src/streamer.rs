use serde::{Deserialize, Serialize};
use sidescape_common::{BlockGrid, EntityId, Layer, Tag};
use sidescape_flora::{LeafLifecycle, TreePlacer};
use sidescape_kernel::{Animator, World};
use sidescape_terrain::GroundStreamer;

use crate::stats::StreamStats;

/// Closed horizontal interval of world that is currently materialized.
/// Both bounds are block-aligned.
///
/// Ground and trunks are kept by their own x. Leaves are kept by the root
/// x of their tree, so canopy blocks may reach up to half a canopy past
/// either bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldRange {
    pub min_x: f32,
    pub max_x: f32,
}

impl WorldRange {
    /// One viewport to the left of the screen, two to the right of its
    /// left edge.
    pub fn initial(grid: BlockGrid, viewport_width: f32) -> Self {
        Self {
            min_x: grid.round_down(-viewport_width),
            max_x: grid.round_down(2.0 * viewport_width),
        }
    }

    pub fn contains(&self, x: f32) -> bool {
        self.min_x <= x && x <= self.max_x
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    fn shift(&mut self, dx: f32) {
        self.min_x += dx;
        self.max_x += dx;
    }
}

/// Keeps a window of ground and trees around the viewpoint.
///
/// The range slides by whole viewport steps: the strip entering on one side
/// is generated, then everything past the other side is destroyed.
#[derive(Debug, Clone)]
pub struct WorldStreamer {
    range: WorldRange,
    viewpoint_x: f32,
    viewport_width: f32,
    step: f32,
    grid: BlockGrid,
    ground: GroundStreamer,
    trees: TreePlacer,
}

impl WorldStreamer {
    pub fn new(ground: GroundStreamer, trees: TreePlacer) -> Self {
        let heights = *ground.heights();
        let grid = heights.grid();
        let window = heights.window();
        Self {
            range: WorldRange::initial(grid, window.width),
            viewpoint_x: window.midpoint_x(),
            viewport_width: window.width,
            step: grid.round_up(window.width),
            grid,
            ground,
            trees,
        }
    }

    pub fn range(&self) -> WorldRange {
        self.range
    }

    pub fn viewpoint_x(&self) -> f32 {
        self.viewpoint_x
    }

    /// Distance the range moves per extension: the viewport width rounded
    /// up to whole blocks, so the bounds stay aligned.
    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn ground(&self) -> &GroundStreamer {
        &self.ground
    }

    pub fn trees(&self) -> &TreePlacer {
        &self.trees
    }

    /// Generate the whole initial range. Call once on an empty world.
    pub fn populate_initial(
        &mut self,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
    ) -> StreamStats {
        let _span = tracing::info_span!("stream_populate").entered();
        let WorldRange { min_x, max_x } = self.range;
        let mut stats = StreamStats::default();
        self.materialize(min_x, max_x + self.grid.size(), world, animator, leaves, &mut stats);
        stats.live_entities = world.entity_count();
        tracing::info!(
            min_x,
            max_x,
            blocks = stats.blocks_created,
            trees = stats.trees_created,
            "initial world populated"
        );
        stats
    }

    /// Move the viewpoint, extend the range wherever it came within one
    /// viewport of an edge, and evict everything that fell outside it.
    ///
    /// Nearby moves slide the range one step at a time, evicting after
    /// each step so at most one extra strip is alive. A jump past a whole
    /// range width drops the old range and generates only the new one.
    pub fn update(
        &mut self,
        viewpoint_x: f32,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
    ) -> StreamStats {
        let _span = tracing::info_span!("stream_update", viewpoint_x).entered();
        let mut stats = StreamStats::default();
        if !viewpoint_x.is_finite() {
            tracing::warn!(viewpoint_x, "ignoring non-finite viewpoint");
            stats.live_entities = world.entity_count();
            return stats;
        }
        self.viewpoint_x = viewpoint_x;

        let shifts = self.steps_short(self.range.max_x - viewpoint_x)
            - self.steps_short(viewpoint_x - self.range.min_x);
        if shifts != 0 {
            if shifts.unsigned_abs() as f64 * self.step as f64 > self.range.width() as f64 {
                self.relocate(shifts, world, animator, leaves, &mut stats);
            } else {
                let direction = shifts.signum() as f32;
                for _ in 0..shifts.unsigned_abs() {
                    self.slide(direction, world, animator, leaves, &mut stats);
                }
            }
            stats.shifts = shifts.clamp(i32::MIN as i64, i32::MAX as i64) as i32;
            tracing::debug!(
                min_x = self.range.min_x,
                max_x = self.range.max_x,
                shifts = stats.shifts,
                evicted = stats.evicted,
                "world range moved"
            );
        }
        stats.live_entities = world.entity_count();
        stats
    }

    /// Whole steps the range must move for an edge `margin` away from the
    /// viewpoint to sit at least one viewport out.
    fn steps_short(&self, margin: f32) -> i64 {
        if margin >= self.viewport_width {
            return 0;
        }
        ((self.viewport_width as f64 - margin as f64) / self.step as f64).ceil() as i64
    }

    /// Generate the strip entering on one side, move the range by one step
    /// toward it, then evict.
    fn slide(
        &mut self,
        direction: f32,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
        stats: &mut StreamStats,
    ) {
        let WorldRange { min_x, max_x } = self.range;
        if direction < 0.0 {
            self.materialize(min_x - self.step, min_x, world, animator, leaves, stats);
        } else {
            let start = max_x + self.grid.size();
            self.materialize(start, start + self.step, world, animator, leaves, stats);
        }
        self.range.shift(direction * self.step);
        stats.evicted += self.evict(world, animator, leaves);
    }

    /// Move the range `shifts` steps at once. The new range shares nothing
    /// with the old one, so everything is evicted before it is filled.
    fn relocate(
        &mut self,
        shifts: i64,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
        stats: &mut StreamStats,
    ) {
        let offset = shifts as f64 * self.step as f64;
        self.range = WorldRange {
            min_x: (self.range.min_x as f64 + offset) as f32,
            max_x: (self.range.max_x as f64 + offset) as f32,
        };
        stats.evicted += self.evict(world, animator, leaves);
        let WorldRange { min_x, max_x } = self.range;
        self.materialize(min_x, max_x + self.grid.size(), world, animator, leaves, stats);
        tracing::info!(min_x, max_x, "world range relocated");
    }

    fn materialize(
        &mut self,
        min_x: f32,
        max_x: f32,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
        stats: &mut StreamStats,
    ) {
        stats.blocks_created += self.ground.create_in_range(world, min_x, max_x);
        stats.trees_created += self.trees.create_in_range(world, animator, leaves, min_x, max_x);
    }

    /// Destroy every streamed entity outside the range. Leaves are judged
    /// by the root of their tree so a canopy leaves with its trunk.
    fn evict(&self, world: &mut World, animator: &mut Animator, leaves: &mut LeafLifecycle) -> usize {
        let doomed: Vec<(EntityId, Tag)> = world
            .entities()
            .iter()
            .filter(|(_, e)| e.tag.is_streamed())
            .filter(|(id, e)| {
                let x = match e.tag {
                    Tag::Leaf => leaves.anchor(**id).unwrap_or(e.transform.position.x),
                    _ => e.transform.position.x,
                };
                !self.range.contains(x)
            })
            .map(|(id, e)| (*id, e.tag))
            .collect();

        let mut evicted = 0;
        for (id, tag) in doomed {
            if world.despawn(id, Layer::for_tag(tag)).is_none() {
                continue;
            }
            if tag == Tag::Leaf {
                leaves.forget(id, animator);
            } else {
                animator.cancel_owner(id);
            }
            evicted += 1;
        }
        evicted
    }
}

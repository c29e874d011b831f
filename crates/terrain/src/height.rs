use sidescape_common::{BlockGrid, WindowSize, WorldConfig};

use crate::noise::noise;

/// Horizontal stretch applied to x before sampling the noise field.
pub const TERRAIN_GRADIENT: f32 = 800.0;

/// Ground height (y of the topmost ground block, y grows downward) at any
/// horizontal coordinate.
///
/// Cheap to copy; holds nothing but the session constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightMap {
    seed: i64,
    window: WindowSize,
    grid: BlockGrid,
    baseline: f32,
}

impl HeightMap {
    pub fn new(config: &WorldConfig) -> Self {
        Self::with_grid(config, BlockGrid::default())
    }

    pub fn with_grid(config: &WorldConfig, grid: BlockGrid) -> Self {
        Self {
            seed: config.seed,
            window: config.window,
            grid,
            baseline: grid.round_down(config.window.height * 0.5),
        }
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn window(&self) -> WindowSize {
        self.window
    }

    pub fn grid(&self) -> BlockGrid {
        self.grid
    }

    /// Height at the spawn column: half the window, rounded down.
    pub fn baseline(&self) -> f32 {
        self.baseline
    }

    pub fn ground_height_at(&self, x: f32) -> f32 {
        if x == self.window.midpoint_x() {
            return self.baseline;
        }
        let block = self.grid.size();
        let sample = noise(f64::from(x / TERRAIN_GRADIENT), self.seed);
        let addition = 2.0 * block * (sample + 1.0).abs() as f32;
        if addition < 0.0 {
            return self.baseline + block;
        }
        if self.baseline + addition > self.window.height {
            return self.grid.round_down(self.window.height - block).max(0.0);
        }
        self.grid.round_down(self.baseline + addition)
    }
}

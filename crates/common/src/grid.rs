use serde::{Deserialize, Serialize};

/// Side length of one block, in world units.
pub const BLOCK_SIZE: f32 = 30.0;

/// Quantizes continuous coordinates to multiples of a fixed block size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockGrid {
    size: f32,
}

impl Default for BlockGrid {
    fn default() -> Self {
        Self::new(BLOCK_SIZE)
    }
}

impl BlockGrid {
    pub fn new(size: f32) -> Self {
        assert!(size.is_finite() && size > 0.0, "block size must be positive");
        Self { size }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    /// True when `coord` is an exact multiple of the block size.
    pub fn is_aligned(&self, coord: f32) -> bool {
        coord % self.size == 0.0
    }

    /// Nearest multiple of the block size that is `<= coord`.
    pub fn round_down(&self, coord: f32) -> f32 {
        (coord / self.size).floor() * self.size
    }

    /// Nearest multiple of the block size that is `>= coord`.
    pub fn round_up(&self, coord: f32) -> f32 {
        (coord / self.size).ceil() * self.size
    }

    /// Rounds a half-open range outward to block multiples.
    ///
    /// Returns `None` for empty or inverted input so that callers iterate
    /// zero times instead of materializing a sliver column.
    pub fn outward(&self, min_x: f32, max_x: f32) -> Option<(f32, f32)> {
        if !(min_x < max_x) {
            return None;
        }
        Some((self.round_down(min_x), self.round_up(max_x)))
    }

    /// Left edges of every block column in `[min_x, max_x)`. Both bounds are
    /// expected to be aligned already.
    pub fn columns(&self, min_x: f32, max_x: f32) -> impl Iterator<Item = f32> + use<> {
        let size = self.size;
        let count = ((max_x - min_x) / size).round().max(0.0) as usize;
        (0..count).map(move |i| min_x + i as f32 * size)
    }
}

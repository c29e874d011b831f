use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity in the world.
///
/// Allocated by the registry from a monotonic counter so that two sessions
/// fed the same inputs hand out the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Content-addressed identifier of a material in the material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u64);

/// Entity tag used by collision rules and eviction filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Untagged,
    Ground,
    Trunk,
    Leaf,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Untagged => "untagged",
            Tag::Ground => "ground",
            Tag::Trunk => "trunk",
            Tag::Leaf => "leaf",
        }
    }

    /// Tags owned by the world streamer and subject to eviction.
    pub fn is_streamed(&self) -> bool {
        matches!(self, Tag::Ground | Tag::Trunk | Tag::Leaf)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry layer. Declaration order is draw order (back to front).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Layer {
    Terrain,
    Foliage,
    Trunks,
}

impl Layer {
    /// The layer an entity with the given tag is registered on.
    pub fn for_tag(tag: Tag) -> Self {
        match tag {
            Tag::Leaf => Layer::Foliage,
            Tag::Trunk => Layer::Trunks,
            Tag::Ground | Tag::Untagged => Layer::Terrain,
        }
    }
}

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }
}

/// Spatial transform of a 2D entity. `position` is the top-left corner in
/// screen orientation (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec2,
    pub dimensions: Vec2,
    pub angle: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            dimensions: Vec2::ONE,
            angle: 0.0,
        }
    }
}

impl Transform {
    /// Square transform of side `size` anchored at `top_left`.
    pub fn square(top_left: Vec2, size: f32) -> Self {
        Self {
            position: top_left,
            dimensions: Vec2::splat(size),
            angle: 0.0,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.position + self.dimensions * 0.5
    }

    pub fn min(&self) -> Vec2 {
        self.position
    }

    pub fn max(&self) -> Vec2 {
        self.position + self.dimensions
    }

    /// Strict overlap: boxes that merely share an edge do not overlap.
    pub fn overlaps(&self, other: &Transform) -> bool {
        let (a0, a1) = (self.min(), self.max());
        let (b0, b1) = (other.min(), other.max());
        a0.x < b1.x && b0.x < a1.x && a0.y < b1.y && b0.y < a1.y
    }
}

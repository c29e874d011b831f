use sidescape_common::{EntityId, Layer, Transform};
use std::collections::{HashMap, HashSet};

use crate::world::World;

/// Fixed-width column partitioning of one registry layer.
///
/// Entities are bucketed by every column their horizontal extent touches,
/// so a query only has to look at the columns its own box spans.
#[derive(Debug, Clone)]
pub(crate) struct ColumnIndex {
    column_width: f32,
    columns: HashMap<i32, HashSet<EntityId>>,
    revision: Option<u64>,
}

impl ColumnIndex {
    pub fn new(column_width: f32) -> Self {
        assert!(column_width > 0.0, "column_width must be positive");
        Self {
            column_width,
            columns: HashMap::new(),
            revision: None,
        }
    }

    /// True when the index was built from the world's current revision.
    pub fn is_fresh(&self, world: &World) -> bool {
        self.revision == Some(world.revision())
    }

    /// Rebuild the whole index from the entities of `layer`.
    pub fn rebuild(&mut self, world: &World, layer: Layer) {
        self.columns.clear();
        for (id, data) in world.entities() {
            if data.layer != layer {
                continue;
            }
            let (first, last) = self.span(&data.transform);
            for col in first..=last {
                self.columns.entry(col).or_default().insert(*id);
            }
        }
        self.revision = Some(world.revision());
    }

    fn span(&self, t: &Transform) -> (i32, i32) {
        let first = (t.min().x / self.column_width).floor() as i32;
        let last = (t.max().x / self.column_width).floor() as i32;
        (first, last.max(first))
    }

    /// Candidates whose columns intersect the horizontal extent of `t`.
    pub fn candidates(&self, t: &Transform) -> HashSet<EntityId> {
        let (first, last) = self.span(t);
        let mut result = HashSet::new();
        for col in first..=last {
            if let Some(ids) = self.columns.get(&col) {
                result.extend(ids);
            }
        }
        result
    }

    #[cfg(test)]
    fn column_count(&self) -> usize {
        self.columns.len()
    }
}

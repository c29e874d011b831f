use glam::Vec2;
use serde::Serialize;
use sidescape_common::{EntityId, Layer, Tag};
use sidescape_flora::{LeafLifecycle, LeafState};
use sidescape_kernel::World;
use std::collections::BTreeMap;
use std::fmt;

/// World inspector for developer tooling.
///
/// Provides read-only queries against the world state for debugging and
/// the command-line driver.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the world state.
    pub fn summary(world: &World) -> WorldSummary {
        let mut by_tag = BTreeMap::new();
        let mut by_layer = BTreeMap::new();
        for data in world.entities().values() {
            *by_tag.entry(data.tag).or_default() += 1;
            *by_layer.entry(data.layer).or_default() += 1;
        }
        WorldSummary {
            tick: world.tick(),
            revision: world.revision(),
            entity_count: world.entity_count(),
            pending_events: world.events().len(),
            by_tag,
            by_layer,
        }
    }

    pub fn inspect_entity(world: &World, id: EntityId) -> Option<EntityInfo> {
        world.get(id).map(|data| EntityInfo {
            id,
            tag: data.tag,
            layer: data.layer,
            position: data.transform.position,
            dimensions: data.transform.dimensions,
            angle: data.transform.angle,
            opacity: data.appearance.opacity,
            velocity: data.body.map(|b| b.velocity),
        })
    }

    /// Ids carrying `tag`, in id order.
    pub fn list_tagged(world: &World, tag: Tag) -> Vec<EntityId> {
        world
            .entities()
            .iter()
            .filter(|(_, e)| e.tag == tag)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Horizontal extent of everything carrying `tag`, by top-left x.
    pub fn span_of(world: &World, tag: Tag) -> Option<(f32, f32)> {
        world
            .entities()
            .values()
            .filter(|e| e.tag == tag)
            .map(|e| e.transform.position.x)
            .fold(None, |acc, x| match acc {
                None => Some((x, x)),
                Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            })
    }

    pub fn leaf_census(leaves: &LeafLifecycle) -> LeafCensus {
        LeafCensus {
            on_tree: leaves.count(LeafState::OnTree),
            falling: leaves.count(LeafState::Falling),
            on_ground: leaves.count(LeafState::OnGround),
        }
    }
}

/// Summary of world state for the inspector.
#[derive(Debug, Clone, Serialize)]
pub struct WorldSummary {
    pub tick: u64,
    pub revision: u64,
    pub entity_count: usize,
    pub pending_events: usize,
    pub by_tag: BTreeMap<Tag, usize>,
    pub by_layer: BTreeMap<Layer, usize>,
}

impl WorldSummary {
    pub fn tagged(&self, tag: Tag) -> usize {
        self.by_tag.get(&tag).copied().unwrap_or(0)
    }
}

impl fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "World: tick={} entities={} ground={} trunk={} leaf={} pending_events={}",
            self.tick,
            self.entity_count,
            self.tagged(Tag::Ground),
            self.tagged(Tag::Trunk),
            self.tagged(Tag::Leaf),
            self.pending_events
        )
    }
}

/// Detailed info about a single entity.
#[derive(Debug, Clone, Serialize)]
pub struct EntityInfo {
    pub id: EntityId,
    pub tag: Tag,
    pub layer: Layer,
    pub position: Vec2,
    pub dimensions: Vec2,
    pub angle: f32,
    pub opacity: f32,
    pub velocity: Option<Vec2>,
}

impl fmt::Display for EntityInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Entity {} [{}] pos=({:.2}, {:.2}) size=({:.2}, {:.2}) angle={:.2} opacity={:.2}",
            self.id,
            self.tag,
            self.position.x,
            self.position.y,
            self.dimensions.x,
            self.dimensions.y,
            self.angle,
            self.opacity,
        )?;
        if let Some(v) = self.velocity {
            write!(f, " vel=({:.2}, {:.2})", v.x, v.y)?;
        }
        Ok(())
    }
}

/// Leaves per lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LeafCensus {
    pub on_tree: usize,
    pub falling: usize,
    pub on_ground: usize,
}

impl LeafCensus {
    pub fn total(&self) -> usize {
        self.on_tree + self.falling + self.on_ground
    }
}

impl fmt::Display for LeafCensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Leaves: on_tree={} falling={} on_ground={}",
            self.on_tree, self.falling, self.on_ground
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidescape_common::{MaterialId, Rgb, Transform};
    use sidescape_kernel::{Animator, Appearance, Body, EntityData};

    fn spawn(world: &mut World, tag: Tag, x: f32) -> EntityId {
        world.spawn(EntityData {
            tag,
            layer: Layer::for_tag(tag),
            transform: Transform::square(Vec2::new(x, 90.0), 30.0),
            appearance: Appearance::opaque(MaterialId(1), Rgb::new(1, 2, 3)),
            body: Some(Body::massless()),
        })
    }

    #[test]
    fn summary_empty_world() {
        let world = World::new();
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 0);
        assert_eq!(summary.entity_count, 0);
        assert_eq!(summary.tagged(Tag::Ground), 0);
    }

    #[test]
    fn summary_counts_by_tag_and_layer() {
        let mut world = World::new();
        spawn(&mut world, Tag::Ground, 0.0);
        spawn(&mut world, Tag::Ground, 30.0);
        spawn(&mut world, Tag::Leaf, 60.0);
        world.step();

        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.entity_count, 3);
        assert_eq!(summary.tagged(Tag::Ground), 2);
        assert_eq!(summary.by_layer[&Layer::Foliage], 1);
        assert_eq!(summary.pending_events, 4); // 3 spawns + 1 step
    }

    #[test]
    fn inspect_entity_found() {
        let mut world = World::new();
        let id = spawn(&mut world, Tag::Trunk, 120.0);
        let info = WorldInspector::inspect_entity(&world, id).unwrap();
        assert_eq!(info.position, Vec2::new(120.0, 90.0));
        assert_eq!(info.layer, Layer::Trunks);
        assert_eq!(info.velocity, Some(Vec2::ZERO));
    }

    #[test]
    fn inspect_entity_not_found() {
        let world = World::new();
        assert!(WorldInspector::inspect_entity(&world, EntityId(7)).is_none());
    }

    #[test]
    fn list_and_span() {
        let mut world = World::new();
        let a = spawn(&mut world, Tag::Ground, -30.0);
        spawn(&mut world, Tag::Leaf, 500.0);
        let b = spawn(&mut world, Tag::Ground, 90.0);
        assert_eq!(WorldInspector::list_tagged(&world, Tag::Ground), vec![a, b]);
        assert_eq!(WorldInspector::span_of(&world, Tag::Ground), Some((-30.0, 90.0)));
        assert_eq!(WorldInspector::span_of(&world, Tag::Trunk), None);
    }

    #[test]
    fn census_follows_lifecycle() {
        let mut world = World::new();
        let mut animator = Animator::new();
        let mut leaves = LeafLifecycle::new(1);
        let a = spawn(&mut world, Tag::Leaf, 0.0);
        let b = spawn(&mut world, Tag::Leaf, 30.0);
        leaves.adopt(&world, &mut animator, a, 0.0);
        leaves.adopt(&world, &mut animator, b, 0.0);
        leaves.fall(b, &mut world, &mut animator);

        let census = WorldInspector::leaf_census(&leaves);
        assert_eq!(census, LeafCensus { on_tree: 1, falling: 1, on_ground: 0 });
        assert_eq!(census.total(), 2);
    }

    #[test]
    fn displays() {
        let mut world = World::new();
        let id = spawn(&mut world, Tag::Leaf, 0.0);
        let summary = format!("{}", WorldInspector::summary(&world));
        assert!(summary.contains("leaf=1"));
        let info = format!("{}", WorldInspector::inspect_entity(&world, id).unwrap());
        assert!(info.contains("[leaf]"));
        assert!(info.contains("vel="));
    }
}

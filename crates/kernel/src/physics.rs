use serde::{Deserialize, Serialize};
use sidescape_common::{BLOCK_SIZE, EntityId, Layer, Tag};
use std::collections::{BTreeMap, BTreeSet};

use crate::broadphase::ColumnIndex;
use crate::world::World;

/// A moving entity started overlapping an entity of a colliding layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEnter {
    pub entity: EntityId,
    pub other: EntityId,
    pub other_tag: Tag,
}

/// Minimal kinematics: velocity integration plus collision-enter reports.
///
/// Collision resolution is left to the bodies' owners; this only tells them
/// when a contact begins. Target layers are assumed static between
/// structural changes, so their column index is rebuilt only when the world
/// revision moves.
#[derive(Debug, Clone, Default)]
pub struct Physics {
    pairs: BTreeMap<(Layer, Layer), ColumnIndex>,
    contacts: BTreeMap<EntityId, BTreeSet<EntityId>>,
}

impl Physics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable collision reports for bodies on `mover` touching
    /// entities on `target`.
    pub fn set_layers_collide(&mut self, mover: Layer, target: Layer, enabled: bool) {
        if enabled {
            self.pairs
                .entry((mover, target))
                .or_insert_with(|| ColumnIndex::new(BLOCK_SIZE));
        } else {
            self.pairs.remove(&(mover, target));
        }
    }

    pub fn layers_collide(&self, mover: Layer, target: Layer) -> bool {
        self.pairs.contains_key(&(mover, target))
    }

    /// Targets `entity` is currently known to touch.
    pub fn contacts_of(&self, entity: EntityId) -> impl Iterator<Item = EntityId> + '_ {
        self.contacts.get(&entity).into_iter().flatten().copied()
    }

    /// Integrate velocities over `dt` and report new contacts.
    pub fn step(&mut self, world: &mut World, dt: f32) -> Vec<CollisionEnter> {
        let mut moved = Vec::new();
        for (id, data) in world.entities().iter() {
            if data.body.is_some_and(|b| b.is_moving()) {
                moved.push(*id);
            }
        }
        for id in &moved {
            if let Some(data) = world.get_mut(*id) {
                if let Some(body) = data.body {
                    data.transform.position += body.velocity * dt;
                }
            }
        }

        let mut entered = Vec::new();
        for (&(mover, target), index) in self.pairs.iter_mut() {
            if !index.is_fresh(world) {
                index.rebuild(world, target);
            }
            for id in &moved {
                let Some(data) = world.get(*id) else { continue };
                if data.layer != mover {
                    continue;
                }
                let mut touching: BTreeSet<EntityId> = index
                    .candidates(&data.transform)
                    .into_iter()
                    .filter(|other| {
                        world
                            .get(*other)
                            .is_some_and(|o| o.transform.overlaps(&data.transform))
                    })
                    .collect();
                let known = self.contacts.entry(*id).or_default();
                for other in touching.difference(known) {
                    let other_tag = world.get(*other).map_or(Tag::Untagged, |o| o.tag);
                    entered.push(CollisionEnter {
                        entity: *id,
                        other: *other,
                        other_tag,
                    });
                }
                // contacts with other target layers are kept
                known.retain(|o| world.get(*o).is_some_and(|e| e.layer != target));
                known.append(&mut touching);
            }
        }

        self.contacts.retain(|id, others| {
            others.retain(|o| world.contains(*o));
            world.contains(*id) && !others.is_empty()
        });

        entered.sort_by_key(|c| (c.entity, c.other));
        tracing::trace!(moved = moved.len(), entered = entered.len(), "physics step");
        entered
    }
}

use glam::Vec2;
use serde::{Deserialize, Serialize};
use sidescape_common::{EntityId, Layer, MaterialId, Rgb, Tag, Transform};
use std::collections::BTreeMap;

/// An event record produced by every structural mutation of the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Entity was registered on a layer.
    Spawned { id: EntityId, tag: Tag, layer: Layer },
    /// Entity was removed from its layer.
    Despawned { id: EntityId, tag: Tag, layer: Layer },
    /// The host advanced one frame.
    Stepped { tick: u64 },
}

/// Visual handle of an entity: which material, which jittered colour, and
/// how opaque it currently is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    pub material: MaterialId,
    pub color: Rgb,
    pub opacity: f32,
}

impl Appearance {
    pub fn opaque(material: MaterialId, color: Rgb) -> Self {
        Self {
            material,
            color,
            opacity: 1.0,
        }
    }
}

/// Physics descriptor. `mass == f32::INFINITY` marks an immovable body;
/// zero mass bodies never push anything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub mass: f32,
    pub velocity: Vec2,
}

impl Body {
    pub fn immovable() -> Self {
        Self {
            mass: f32::INFINITY,
            velocity: Vec2::ZERO,
        }
    }

    pub fn massless() -> Self {
        Self {
            mass: 0.0,
            velocity: Vec2::ZERO,
        }
    }

    pub fn is_moving(&self) -> bool {
        self.velocity != Vec2::ZERO
    }
}

/// Per-entity record: composition of position, visual and optional physics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityData {
    pub tag: Tag,
    pub layer: Layer,
    pub transform: Transform,
    pub appearance: Appearance,
    pub body: Option<Body>,
}

/// The object registry.
///
/// Uses BTreeMap for deterministic iteration order. Ids are handed out from
/// a monotonic counter, so replaying the same sequence of spawns produces
/// the same ids and the same [`World::state_hash`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    next_id: u64,
    tick: u64,
    /// Bumped on every spawn and despawn; lets indexes detect staleness.
    revision: u64,
    /// Append-only event log of all structural mutations.
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty registry at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live entities carrying `tag`.
    pub fn count_tagged(&self, tag: Tag) -> usize {
        self.entities.values().filter(|e| e.tag == tag).count()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Read-only access to all entities in id order.
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    /// Register an entity on its layer. Returns its id.
    pub fn spawn(&mut self, data: EntityData) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.revision += 1;
        self.event_log.push(WorldEvent::Spawned {
            id,
            tag: data.tag,
            layer: data.layer,
        });
        self.entities.insert(id, data);
        id
    }

    /// Remove an entity from `layer`. Nothing happens (and `None` is
    /// returned) when the entity is unknown or lives on another layer.
    pub fn despawn(&mut self, id: EntityId, layer: Layer) -> Option<EntityData> {
        if self.entities.get(&id)?.layer != layer {
            return None;
        }
        let data = self.entities.remove(&id)?;
        self.revision += 1;
        self.event_log.push(WorldEvent::Despawned {
            id,
            tag: data.tag,
            layer,
        });
        Some(data)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityData> {
        self.entities.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Ids of every entity on `layer`, in id order.
    pub fn ids_on_layer(&self, layer: Layer) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, e)| e.layer == layer)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Advance the frame counter.
    pub fn step(&mut self) {
        self.tick += 1;
        self.event_log.push(WorldEvent::Stepped { tick: self.tick });
    }

    /// Compute a deterministic hash of the registry for comparison.
    /// Uses canonical (BTreeMap) iteration order.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325; // FNV offset basis
        let mix = |h: &mut u64, bytes: &[u8]| {
            for &b in bytes {
                *h ^= b as u64;
                *h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        mix(&mut h, &self.tick.to_le_bytes());
        for (id, data) in &self.entities {
            let t = &data.transform;
            mix(&mut h, &id.0.to_le_bytes());
            mix(&mut h, data.tag.as_str().as_bytes());
            mix(&mut h, &t.position.x.to_le_bytes());
            mix(&mut h, &t.position.y.to_le_bytes());
            mix(&mut h, &t.dimensions.x.to_le_bytes());
            mix(&mut h, &t.dimensions.y.to_le_bytes());
            mix(&mut h, &t.angle.to_le_bytes());
            mix(&mut h, &data.appearance.color.0);
            mix(&mut h, &data.appearance.opacity.to_le_bytes());
        }
        h
    }
}

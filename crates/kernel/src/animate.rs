//! Smooth interpolation of entity properties over time.

use serde::{Deserialize, Serialize};
use sidescape_common::EntityId;
use std::collections::{BTreeMap, HashMap};

use crate::world::World;

/// Easing curve applied to the normalized phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Easing {
    Linear,
    /// Smoothstep: zero slope at both ends.
    Cubic,
}

impl Easing {
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::Cubic => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// What happens when a transition reaches its final value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    /// Stop at `to`; the animation is retired.
    Once,
    /// Jump back to `from` and run again.
    Loop,
    /// Run back toward `from`, then forward again, forever.
    BackAndForth,
}

/// Interpolates an `f32` from `from` to `to` over `period` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: f32,
    pub to: f32,
    pub easing: Easing,
    pub period: f32,
    pub repeat: Repeat,
    elapsed: f32,
}

impl Transition {
    pub fn new(from: f32, to: f32, easing: Easing, period: f32, repeat: Repeat) -> Self {
        assert!(
            period.is_finite() && period > 0.0,
            "transition period must be positive"
        );
        Self {
            from,
            to,
            easing,
            period,
            repeat,
            elapsed: 0.0,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Normalized, un-eased position in `[0, 1]`.
    fn phase(&self) -> f32 {
        match self.repeat {
            Repeat::Once => (self.elapsed / self.period).min(1.0),
            Repeat::Loop => (self.elapsed % self.period) / self.period,
            Repeat::BackAndForth => {
                let cycle = self.elapsed % (2.0 * self.period);
                if cycle <= self.period {
                    cycle / self.period
                } else {
                    2.0 - cycle / self.period
                }
            }
        }
    }

    pub fn value(&self) -> f32 {
        self.from + (self.to - self.from) * self.easing.apply(self.phase())
    }

    pub fn is_finished(&self) -> bool {
        self.repeat == Repeat::Once && self.elapsed >= self.period
    }

    /// Advance by `dt` seconds. Returns true once a one-shot transition
    /// has reached its final value. Repeating transitions keep `elapsed`
    /// within one back-and-forth cycle.
    pub fn advance(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.repeat != Repeat::Once {
            self.elapsed %= 2.0 * self.period;
        }
        self.is_finished()
    }
}

/// Entity property an animation writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Property {
    /// Render angle in degrees.
    Angle,
    /// Horizontal dimension.
    Width,
    /// Horizontal velocity of the body.
    VelocityX,
    Opacity,
}

/// Identity of a running animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnimationId(pub u64);

#[derive(Debug, Clone)]
struct Animation {
    owner: EntityId,
    property: Property,
    transition: Transition,
}

/// Set of active animations, at most one per `(entity, property)` slot.
#[derive(Debug, Clone, Default)]
pub struct Animator {
    animations: BTreeMap<AnimationId, Animation>,
    slots: HashMap<(EntityId, Property), AnimationId>,
    next_id: u64,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn is_active(&self, id: AnimationId) -> bool {
        self.animations.contains_key(&id)
    }

    /// The animation currently driving `property` of `owner`, if any.
    pub fn slot(&self, owner: EntityId, property: Property) -> Option<AnimationId> {
        self.slots.get(&(owner, property)).copied()
    }

    pub fn transition(&self, id: AnimationId) -> Option<&Transition> {
        self.animations.get(&id).map(|a| &a.transition)
    }

    /// Start animating `property` of `owner`. Whatever previously occupied
    /// that slot is cancelled first.
    pub fn start(&mut self, owner: EntityId, property: Property, transition: Transition) -> AnimationId {
        self.cancel_slot(owner, property);
        let id = AnimationId(self.next_id);
        self.next_id += 1;
        self.animations.insert(
            id,
            Animation {
                owner,
                property,
                transition,
            },
        );
        self.slots.insert((owner, property), id);
        id
    }

    /// Detach one animation. Returns false if it was no longer running.
    pub fn cancel(&mut self, id: AnimationId) -> bool {
        match self.animations.remove(&id) {
            Some(anim) => {
                self.slots.remove(&(anim.owner, anim.property));
                true
            }
            None => false,
        }
    }

    pub fn cancel_slot(&mut self, owner: EntityId, property: Property) -> Option<AnimationId> {
        let id = self.slots.remove(&(owner, property))?;
        self.animations.remove(&id);
        Some(id)
    }

    /// Detach every animation of `owner`. Returns how many were removed.
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let ids: Vec<AnimationId> = self
            .animations
            .iter()
            .filter(|(_, a)| a.owner == owner)
            .map(|(id, _)| *id)
            .collect();
        for id in &ids {
            self.cancel(*id);
        }
        ids.len()
    }

    /// Advance every animation by `dt` and write the new values into the
    /// world. Finished one-shots and animations whose owner is gone are
    /// retired.
    pub fn advance(&mut self, dt: f32, world: &mut World) {
        let mut retired = Vec::new();
        for (id, anim) in self.animations.iter_mut() {
            let Some(entity) = world.get_mut(anim.owner) else {
                retired.push(*id);
                continue;
            };
            let finished = anim.transition.advance(dt);
            let value = anim.transition.value();
            match anim.property {
                Property::Angle => entity.transform.angle = value,
                Property::Width => entity.transform.dimensions.x = value,
                Property::Opacity => entity.appearance.opacity = value,
                Property::VelocityX => {
                    if let Some(body) = entity.body.as_mut() {
                        body.velocity.x = value;
                    }
                }
            }
            if finished {
                retired.push(*id);
            }
        }
        for id in retired {
            self.cancel(id);
        }
    }
}

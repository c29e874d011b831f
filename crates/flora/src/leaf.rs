use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use sidescape_common::{BLOCK_SIZE, EntityId, Tag, splitmix64};
use sidescape_kernel::{
    Animator, CollisionEnter, Easing, Property, Repeat, Scheduler, TaskId, Transition, World,
};
use std::collections::BTreeMap;

const TIMER_STREAM: u64 = 0x6c65_6166; // "leaf"

/// Where a leaf is in its fall-and-reset cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LeafState {
    OnTree,
    Falling,
    OnGround,
}

/// Work a leaf schedules for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeafTask {
    /// Recurring check: reset a grounded leaf, or maybe drop a hanging one.
    Cycle,
    /// Zero the velocity once the collision step that grounded the leaf
    /// has completed.
    Settle,
}

/// Durations, speeds and odds of the leaf animation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafTimings {
    pub fade_out: f32,
    pub fall_speed: f32,
    /// The recurring timer interval is drawn once per leaf from
    /// `cycle_min..cycle_max`, plus one second.
    pub cycle_min: f32,
    pub cycle_max: f32,
    pub fall_chance: f64,
    pub sway_angle: f32,
    pub sway_period: f32,
    pub shrink: f32,
    pub shrink_period: f32,
    pub drift_speed: f32,
    pub drift_period: f32,
}

impl Default for LeafTimings {
    fn default() -> Self {
        Self {
            fade_out: 9.0,
            fall_speed: 50.0,
            cycle_min: 9.0,
            cycle_max: 14.0,
            fall_chance: 1.0 / 8.0,
            sway_angle: 2.0,
            sway_period: 1.0,
            shrink: BLOCK_SIZE / 5.0,
            shrink_period: 1.0,
            drift_speed: 100.0,
            drift_period: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Leaf {
    origin: Vec2,
    anchor: f32,
    state: LeafState,
    cycle: TaskId,
}

/// Drives every leaf through `OnTree -> Falling -> OnGround -> OnTree`.
///
/// Sway and shrink animations are started once at adoption and never
/// touched by state transitions; the drift and fade animations belong to
/// the `Falling` state and are detached on the way out of it.
#[derive(Debug, Clone)]
pub struct LeafLifecycle {
    leaves: BTreeMap<EntityId, Leaf>,
    scheduler: Scheduler<LeafTask>,
    rng: ChaCha8Rng,
    timings: LeafTimings,
}

impl LeafLifecycle {
    pub fn new(seed: i64) -> Self {
        Self::with_timings(seed, LeafTimings::default())
    }

    pub fn with_timings(seed: i64, timings: LeafTimings) -> Self {
        assert!(
            timings.cycle_min >= 0.0 && timings.cycle_max > timings.cycle_min,
            "leaf cycle window must be non-empty"
        );
        Self {
            leaves: BTreeMap::new(),
            scheduler: Scheduler::new(),
            rng: ChaCha8Rng::seed_from_u64(splitmix64(seed as u64 ^ TIMER_STREAM)),
            timings,
        }
    }

    pub fn timings(&self) -> &LeafTimings {
        &self.timings
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn state(&self, id: EntityId) -> Option<LeafState> {
        self.leaves.get(&id).map(|l| l.state)
    }

    /// Spawn position recorded when the leaf was adopted.
    pub fn origin(&self, id: EntityId) -> Option<Vec2> {
        self.leaves.get(&id).map(|l| l.origin)
    }

    /// Root x of the tree the leaf grew on.
    pub fn anchor(&self, id: EntityId) -> Option<f32> {
        self.leaves.get(&id).map(|l| l.anchor)
    }

    pub fn count(&self, state: LeafState) -> usize {
        self.leaves.values().filter(|l| l.state == state).count()
    }

    /// Take over a freshly spawned leaf entity: remember where it hangs and
    /// which tree (`anchor`, the trunk's root x) it belongs to, arm its
    /// recurring timer and start the cosmetic sway and shrink. Returns false
    /// if the entity does not exist.
    pub fn adopt(&mut self, world: &World, animator: &mut Animator, id: EntityId, anchor: f32) -> bool {
        let Some(entity) = world.get(id) else {
            return false;
        };
        let t = self.timings;
        let origin = entity.transform.position;
        let width = entity.transform.dimensions.x;

        let interval = self.rng.gen_range(t.cycle_min..t.cycle_max) + 1.0;
        let cycle = self.scheduler.every(id, interval, LeafTask::Cycle);
        animator.start(
            id,
            Property::Angle,
            Transition::new(t.sway_angle, -t.sway_angle, Easing::Cubic, t.sway_period, Repeat::BackAndForth),
        );
        animator.start(
            id,
            Property::Width,
            Transition::new(width, width - t.shrink, Easing::Cubic, t.shrink_period, Repeat::BackAndForth),
        );
        self.leaves.insert(
            id,
            Leaf {
                origin,
                anchor,
                state: LeafState::OnTree,
                cycle,
            },
        );
        true
    }

    /// Drop all bookkeeping for a leaf that left the world.
    pub fn forget(&mut self, id: EntityId, animator: &mut Animator) -> bool {
        let Some(leaf) = self.leaves.remove(&id) else {
            return false;
        };
        self.scheduler.cancel(leaf.cycle);
        self.scheduler.cancel_owner(id);
        animator.cancel_owner(id);
        true
    }

    /// Advance leaf timers by `dt` and apply whatever came due.
    pub fn advance(&mut self, dt: f32, world: &mut World, animator: &mut Animator) {
        for fired in self.scheduler.advance(dt) {
            if !world.contains(fired.owner) {
                self.forget(fired.owner, animator);
                continue;
            }
            match fired.action {
                LeafTask::Cycle => self.on_cycle(fired.owner, world, animator),
                LeafTask::Settle => settle(world, fired.owner),
            }
        }
    }

    fn on_cycle(&mut self, id: EntityId, world: &mut World, animator: &mut Animator) {
        match self.state(id) {
            Some(LeafState::OnGround) => self.reset_to_tree(id, world, animator),
            Some(LeafState::OnTree) => {
                if self.rng.gen_bool(self.timings.fall_chance) {
                    self.fall(id, world, animator);
                }
            }
            Some(LeafState::Falling) | None => {}
        }
    }

    /// Start the fall: constant downward speed, fade-out and horizontal
    /// drift.
    pub fn fall(&mut self, id: EntityId, world: &mut World, animator: &mut Animator) {
        let t = self.timings;
        let Some(leaf) = self.leaves.get_mut(&id) else {
            return;
        };
        let Some(entity) = world.get_mut(id) else {
            return;
        };
        if let Some(body) = entity.body.as_mut() {
            body.velocity.y = t.fall_speed;
        }
        let opacity = entity.appearance.opacity;
        leaf.state = LeafState::Falling;
        animator.start(
            id,
            Property::VelocityX,
            Transition::new(-t.drift_speed, t.drift_speed, Easing::Cubic, t.drift_period, Repeat::BackAndForth),
        );
        animator.start(
            id,
            Property::Opacity,
            Transition::new(opacity, 0.0, Easing::Linear, t.fade_out, Repeat::Once),
        );
        tracing::trace!(%id, "leaf falling");
    }

    /// Put a grounded leaf back where it was spawned, fully opaque.
    fn reset_to_tree(&mut self, id: EntityId, world: &mut World, animator: &mut Animator) {
        let Some(leaf) = self.leaves.get_mut(&id) else {
            return;
        };
        animator.cancel_slot(id, Property::VelocityX);
        animator.cancel_slot(id, Property::Opacity);
        if let Some(entity) = world.get_mut(id) {
            entity.transform.position = leaf.origin;
            entity.appearance.opacity = 1.0;
            if let Some(body) = entity.body.as_mut() {
                body.velocity = Vec2::ZERO;
            }
        }
        leaf.state = LeafState::OnTree;
        tracing::trace!(%id, "leaf back on tree");
    }

    /// React to a collision-enter report. Returns true if the leaf landed.
    pub fn on_collision(&mut self, hit: &CollisionEnter, animator: &mut Animator) -> bool {
        if hit.other_tag != Tag::Ground {
            return false;
        }
        let Some(leaf) = self.leaves.get_mut(&hit.entity) else {
            return false;
        };
        if leaf.state != LeafState::Falling {
            return false;
        }
        leaf.state = LeafState::OnGround;
        animator.cancel_slot(hit.entity, Property::VelocityX);
        self.scheduler.once(hit.entity, 0.0, LeafTask::Settle);
        true
    }
}

fn settle(world: &mut World, id: EntityId) {
    if let Some(body) = world.get_mut(id).and_then(|e| e.body.as_mut()) {
        body.velocity = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidescape_common::{Layer, MaterialId, Rgb, Transform};
    use sidescape_kernel::{Appearance, Body, EntityData};

    fn spawn_leaf(world: &mut World, at: Vec2) -> EntityId {
        world.spawn(EntityData {
            tag: Tag::Leaf,
            layer: Layer::Foliage,
            transform: Transform::square(at, BLOCK_SIZE),
            appearance: Appearance::opaque(MaterialId(0), Rgb::new(50, 200, 30)),
            body: Some(Body::massless()),
        })
    }

    fn ground_hit(leaf: EntityId) -> CollisionEnter {
        CollisionEnter {
            entity: leaf,
            other: EntityId(999),
            other_tag: Tag::Ground,
        }
    }

    fn setup() -> (World, Animator, LeafLifecycle, EntityId) {
        let mut world = World::new();
        let mut animator = Animator::new();
        let mut leaves = LeafLifecycle::new(1000);
        let id = spawn_leaf(&mut world, Vec2::new(60.0, 120.0));
        assert!(leaves.adopt(&world, &mut animator, id, 60.0));
        (world, animator, leaves, id)
    }

    #[test]
    fn adoption_starts_on_tree_with_cosmetics() {
        let (_, animator, leaves, id) = setup();
        assert_eq!(leaves.state(id), Some(LeafState::OnTree));
        assert_eq!(leaves.origin(id), Some(Vec2::new(60.0, 120.0)));
        assert_eq!(leaves.anchor(id), Some(60.0));
        assert!(animator.slot(id, Property::Angle).is_some());
        assert!(animator.slot(id, Property::Width).is_some());
        assert!(animator.slot(id, Property::VelocityX).is_none());
    }

    #[test]
    fn adopting_missing_entity_is_refused() {
        let world = World::new();
        let mut animator = Animator::new();
        let mut leaves = LeafLifecycle::new(1);
        assert!(!leaves.adopt(&world, &mut animator, EntityId(42), 0.0));
        assert!(leaves.is_empty());
    }

    #[test]
    fn fall_sets_velocity_drift_and_fade() {
        let (mut world, mut animator, mut leaves, id) = setup();
        leaves.fall(id, &mut world, &mut animator);
        assert_eq!(leaves.state(id), Some(LeafState::Falling));
        assert_eq!(world.get(id).unwrap().body.unwrap().velocity.y, 50.0);
        assert!(animator.slot(id, Property::VelocityX).is_some());
        assert!(animator.slot(id, Property::Opacity).is_some());
    }

    #[test]
    fn landing_cancels_drift_and_defers_settle() {
        let (mut world, mut animator, mut leaves, id) = setup();
        leaves.fall(id, &mut world, &mut animator);
        animator.advance(0.3, &mut world);

        assert!(leaves.on_collision(&ground_hit(id), &mut animator));
        assert_eq!(leaves.state(id), Some(LeafState::OnGround));
        assert!(animator.slot(id, Property::VelocityX).is_none());
        // velocity is untouched until the deferred task runs
        assert_ne!(world.get(id).unwrap().body.unwrap().velocity, Vec2::ZERO);

        leaves.advance(0.0, &mut world, &mut animator);
        assert_eq!(world.get(id).unwrap().body.unwrap().velocity, Vec2::ZERO);
    }

    #[test]
    fn collisions_outside_falling_are_ignored() {
        let (_, mut animator, mut leaves, id) = setup();
        assert!(!leaves.on_collision(&ground_hit(id), &mut animator));
        assert_eq!(leaves.state(id), Some(LeafState::OnTree));

        let trunk_hit = CollisionEnter {
            other_tag: Tag::Trunk,
            ..ground_hit(id)
        };
        assert!(!leaves.on_collision(&trunk_hit, &mut animator));
    }

    #[test]
    fn grounded_leaf_resets_to_exact_origin() {
        let (mut world, mut animator, mut leaves, id) = setup();
        leaves.fall(id, &mut world, &mut animator);
        for _ in 0..30 {
            animator.advance(0.1, &mut world);
            let e = world.get_mut(id).unwrap();
            let v = e.body.unwrap().velocity;
            e.transform.position += v * 0.1;
        }
        leaves.on_collision(&ground_hit(id), &mut animator);
        leaves.advance(0.0, &mut world, &mut animator);
        assert_ne!(world.get(id).unwrap().transform.position, Vec2::new(60.0, 120.0));

        // the recurring timer fires within its window (at most 15 s)
        for _ in 0..16 {
            leaves.advance(1.0, &mut world, &mut animator);
            if leaves.state(id) == Some(LeafState::OnTree) {
                break;
            }
        }
        assert_eq!(leaves.state(id), Some(LeafState::OnTree));
        let e = world.get(id).unwrap();
        assert_eq!(e.transform.position, Vec2::new(60.0, 120.0));
        assert_eq!(e.appearance.opacity, 1.0);
        assert!(animator.slot(id, Property::VelocityX).is_none());
        assert!(animator.slot(id, Property::Opacity).is_none());
    }

    #[test]
    fn cosmetics_survive_state_transitions() {
        let (mut world, mut animator, mut leaves, id) = setup();
        let sway = animator.slot(id, Property::Angle).unwrap();
        let shrink = animator.slot(id, Property::Width).unwrap();
        leaves.fall(id, &mut world, &mut animator);
        leaves.on_collision(&ground_hit(id), &mut animator);
        leaves.reset_to_tree(id, &mut world, &mut animator);
        assert_eq!(animator.slot(id, Property::Angle), Some(sway));
        assert_eq!(animator.slot(id, Property::Width), Some(shrink));
    }

    #[test]
    fn hanging_leaves_eventually_fall() {
        let mut world = World::new();
        let mut animator = Animator::new();
        let mut leaves = LeafLifecycle::new(7);
        for i in 0..40 {
            let id = spawn_leaf(&mut world, Vec2::new(i as f32 * 30.0, 0.0));
            leaves.adopt(&world, &mut animator, id, i as f32 * 30.0);
        }
        for _ in 0..600 {
            leaves.advance(1.0, &mut world, &mut animator);
        }
        assert!(leaves.count(LeafState::Falling) > 0);
    }

    #[test]
    fn forget_detaches_everything() {
        let (mut world, mut animator, mut leaves, id) = setup();
        leaves.fall(id, &mut world, &mut animator);
        assert!(leaves.forget(id, &mut animator));
        assert!(!leaves.forget(id, &mut animator));
        assert!(animator.is_empty());
        assert_eq!(leaves.state(id), None);
    }

    #[test]
    fn evicted_leaf_is_forgotten_when_its_timer_fires() {
        let (mut world, mut animator, mut leaves, id) = setup();
        world.despawn(id, Layer::Foliage);
        for _ in 0..16 {
            leaves.advance(1.0, &mut world, &mut animator);
        }
        assert!(leaves.is_empty());
    }

    #[test]
    fn same_seed_same_timers() {
        let run = || {
            let mut world = World::new();
            let mut animator = Animator::new();
            let mut leaves = LeafLifecycle::new(99);
            for i in 0..20 {
                let id = spawn_leaf(&mut world, Vec2::new(i as f32 * 30.0, 0.0));
                leaves.adopt(&world, &mut animator, id, i as f32 * 30.0);
            }
            for _ in 0..120 {
                leaves.advance(0.5, &mut world, &mut animator);
            }
            world.state_hash()
        };
        assert_eq!(run(), run());
    }
}

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sidescape_common::mix_position;
use sidescape_kernel::{Animator, World};

use crate::builder::TreeBuilder;
use crate::leaf::LeafLifecycle;

/// Empty blocks kept between neighbouring canopies.
pub const TREE_GAP_BLOCKS: usize = 2;

/// A tree stands at a slot when a die seeded by the slot rolls this face.
const TREE_FACE: u32 = 4;
const DIE_FACES: u32 = 5;

/// Decides where trees stand and asks the [`TreeBuilder`] to build them.
///
/// Candidate slots sit on a fixed lattice (multiples of the tree spacing)
/// so a range streamed in twice yields the same slots both times.
#[derive(Debug, Clone)]
pub struct TreePlacer {
    builder: TreeBuilder,
}

impl TreePlacer {
    pub fn new(builder: TreeBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    /// Distance between candidate slots: one canopy plus the gap.
    pub fn spacing(&self) -> f32 {
        self.builder.canopy_size() + TREE_GAP_BLOCKS as f32 * self.builder.heights().grid().size()
    }

    /// Pure function of `(x, seed)`. The spawn column never holds a tree.
    pub fn is_place_tree(&self, x: f32) -> bool {
        let heights = self.builder.heights();
        if x == heights.window().midpoint_x() {
            return false;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(mix_position(x.round() as i64, heights.seed()));
        rng.gen_range(1..=DIE_FACES) == TREE_FACE
    }

    /// Candidate slots in `[min_x, max_x)` after rounding the range outward
    /// to whole blocks. Slots are the multiples of [`Self::spacing`] inside
    /// that range, not offsets stepped from its left edge, so the answer
    /// does not depend on where a strip happens to start.
    pub fn slots(&self, min_x: f32, max_x: f32) -> impl Iterator<Item = f32> + use<> {
        let spacing = self.spacing();
        let (first, end) = match self.builder.heights().grid().outward(min_x, max_x) {
            Some((min, max)) => ((min / spacing).ceil() as i64, max),
            None => (0, f32::MIN),
        };
        (first..)
            .map(move |k| k as f32 * spacing)
            .take_while(move |x| *x < end)
    }

    /// Build every tree whose slot falls in `[min_x, max_x)`. Returns the
    /// number of trees built.
    pub fn create_in_range(
        &mut self,
        world: &mut World,
        animator: &mut Animator,
        leaves: &mut LeafLifecycle,
        min_x: f32,
        max_x: f32,
    ) -> usize {
        let _span = tracing::debug_span!("tree_range", min_x, max_x).entered();
        let mut built = 0;
        for x in self.slots(min_x, max_x) {
            if !self.is_place_tree(x) {
                continue;
            }
            let top = self.builder.create_trunk(world, x);
            self.builder.create_tree_top(world, animator, leaves, top);
            built += 1;
        }
        tracing::debug!(built, "trees created");
        built
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidescape_assets::{LEAF, MaterialTable, TRUNK};
    use sidescape_common::{Layer, Tag, WindowSize, WorldConfig};
    use sidescape_terrain::HeightMap;

    fn placer(seed: i64) -> TreePlacer {
        let config = WorldConfig::new(seed, WindowSize::new(800.0, 600.0));
        let table = MaterialTable::standard();
        TreePlacer::new(TreeBuilder::new(
            HeightMap::new(&config),
            table.swatch(TRUNK).unwrap(),
            table.swatch(LEAF).unwrap(),
        ))
    }

    #[test]
    fn spacing_is_canopy_plus_gap() {
        assert_eq!(placer(1).spacing(), 210.0);
    }

    #[test]
    fn midpoint_never_holds_a_tree() {
        let config = WorldConfig::new(1, WindowSize::new(840.0, 600.0));
        let table = MaterialTable::standard();
        let p = TreePlacer::new(TreeBuilder::new(
            HeightMap::new(&config),
            table.swatch(TRUNK).unwrap(),
            table.swatch(LEAF).unwrap(),
        ));
        // 420 is both the midpoint and a lattice slot
        assert!(!p.is_place_tree(420.0));
        assert!(p.slots(0.0, 840.0).any(|x| x == 420.0));
    }

    #[test]
    fn placement_is_pure() {
        let a = placer(1000);
        let b = placer(1000);
        for i in -200..200 {
            let x = i as f32 * 210.0;
            assert_eq!(a.is_place_tree(x), b.is_place_tree(x));
            assert_eq!(a.is_place_tree(x), a.is_place_tree(x));
        }
    }

    #[test]
    fn placement_rate_is_about_one_in_five() {
        let p = placer(1000);
        let hits = (-1000..1000).filter(|i| p.is_place_tree(*i as f32 * 210.0)).count();
        let rate = hits as f64 / 2000.0;
        assert!((0.15..=0.25).contains(&rate), "{rate}");
    }

    #[test]
    fn slots_lie_on_the_lattice() {
        let p = placer(1);
        let slots: Vec<f32> = p.slots(-500.0, 500.0).collect();
        assert_eq!(slots, vec![-420.0, -210.0, 0.0, 210.0, 420.0]);
        assert_eq!(p.slots(0.0, 210.0).collect::<Vec<_>>(), vec![0.0]);
        assert_eq!(p.slots(100.0, 100.0).count(), 0);
        assert_eq!(p.slots(300.0, 0.0).count(), 0);
    }

    #[test]
    fn split_ranges_match_one_range() {
        let p = placer(9);
        let whole: Vec<f32> = p.slots(-810.0, 1620.0).collect();
        let mut parts: Vec<f32> = p.slots(-810.0, 0.0).collect();
        parts.extend(p.slots(0.0, 810.0));
        parts.extend(p.slots(810.0, 1620.0));
        assert_eq!(whole, parts);
    }

    #[test]
    fn trees_are_built_at_chosen_slots() {
        let mut p = placer(1000);
        let mut world = World::new();
        let mut animator = Animator::new();
        let mut leaves = LeafLifecycle::new(1000);
        let built = p.create_in_range(&mut world, &mut animator, &mut leaves, -4200.0, 4200.0);

        let expected = p.slots(-4200.0, 4200.0).filter(|x| p.is_place_tree(*x)).count();
        assert_eq!(built, expected);
        assert!(built > 0);
        assert_eq!(p.builder().trunk_cache().len(), built);
        assert_eq!(world.count_tagged(Tag::Leaf), leaves.len());
        for id in world.ids_on_layer(Layer::Trunks) {
            let x = world.get(id).unwrap().transform.position.x;
            assert!(p.is_place_tree(x));
        }
    }

    #[test]
    fn empty_range_builds_nothing() {
        let mut p = placer(1000);
        let mut world = World::new();
        let mut animator = Animator::new();
        let mut leaves = LeafLifecycle::new(1000);
        assert_eq!(p.create_in_range(&mut world, &mut animator, &mut leaves, 50.0, 50.0), 0);
        assert_eq!(world.entity_count(), 0);
    }
}

//! Material table: the shared rendering resources every generated entity
//! refers to.
//!
//! The table is populated once at startup and only read afterwards;
//! generators look up a [`Swatch`] at construction time and keep it. Ids are
//! content-addressed, so registering the same material twice is a no-op.

use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sidescape_common::{MaterialId, Rgb};
use std::collections::BTreeMap;
use std::path::Path;

/// Default per-channel jitter applied by [`approximate_color`].
pub const DEFAULT_COLOR_DELTA: u8 = 10;

pub const GROUND: &str = "ground";
pub const TRUNK: &str = "trunk";
pub const LEAF: &str = "leaf";

/// A named base colour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub base_color: Rgb,
}

/// What a generator needs to paint an entity: the material id and the base
/// colour to jitter around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    pub material: MaterialId,
    pub base_color: Rgb,
}

/// Errors from material table operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown material: {0}")]
    UnknownMaterial(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Content-addressed material registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialTable {
    materials: BTreeMap<MaterialId, Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The palette the world generator paints with.
    pub fn standard() -> Self {
        let mut table = Self::new();
        table.register(Material {
            name: GROUND.into(),
            base_color: Rgb::new(212, 123, 74),
        });
        table.register(Material {
            name: TRUNK.into(),
            base_color: Rgb::new(100, 50, 20),
        });
        table.register(Material {
            name: LEAF.into(),
            base_color: Rgb::new(50, 200, 30),
        });
        table
    }

    /// Register a material and return its id.
    pub fn register(&mut self, material: Material) -> MaterialId {
        let id = content_hash(&material);
        self.materials.insert(id, material);
        id
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(&id)
    }

    /// Look up a material by name.
    pub fn swatch(&self, name: &str) -> Result<Swatch, AssetError> {
        self.materials
            .iter()
            .find(|(_, m)| m.name == name)
            .map(|(id, m)| Swatch {
                material: *id,
                base_color: m.base_color,
            })
            .ok_or_else(|| AssetError::UnknownMaterial(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MaterialId, &Material)> {
        self.materials.iter()
    }

    /// Save the table to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path.as_ref())?;
        let table: Self = serde_json::from_reader(file)?;
        tracing::debug!(path = %path.as_ref().display(), materials = table.len(), "material table loaded");
        Ok(table)
    }
}

pub fn crate_info() -> &'static str {
    "sidescape-assets v0.1.0"
}

fn content_hash(material: &Material) -> MaterialId {
    let mut hasher = Sha256::new();
    hasher.update(material.name.as_bytes());
    hasher.update(material.base_color.0);
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    MaterialId(u64::from_le_bytes(bytes))
}

/// A colour close to `base`: each channel moves by at most `delta`,
/// clamped to the valid range.
pub fn approximate_color(base: Rgb, delta: u8, rng: &mut impl Rng) -> Rgb {
    let mut out = [0u8; 3];
    for (channel, value) in base.0.iter().enumerate() {
        let v = i16::from(*value);
        let d = i16::from(delta);
        out[channel] = rng.gen_range(v - d..=v + d).clamp(0, 255) as u8;
    }
    Rgb(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }

    #[test]
    fn standard_palette_has_three_swatches() {
        let table = MaterialTable::standard();
        assert_eq!(table.len(), 3);
        let ground = table.swatch(GROUND).unwrap();
        assert_eq!(ground.base_color, Rgb::new(212, 123, 74));
        assert_eq!(table.get(ground.material).unwrap().name, GROUND);
    }

    #[test]
    fn unknown_swatch_is_an_error() {
        let table = MaterialTable::standard();
        assert!(matches!(
            table.swatch("lava"),
            Err(AssetError::UnknownMaterial(name)) if name == "lava"
        ));
    }

    #[test]
    fn content_addressed_dedup() {
        let mut table = MaterialTable::new();
        let m = Material {
            name: "rock".into(),
            base_color: Rgb::new(1, 2, 3),
        };
        let id1 = table.register(m.clone());
        let id2 = table.register(m);
        assert_eq!(id1, id2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn approximate_color_stays_within_delta() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let base = Rgb::new(250, 5, 128);
        for _ in 0..200 {
            let c = approximate_color(base, DEFAULT_COLOR_DELTA, &mut rng);
            for (got, want) in c.0.iter().zip(base.0.iter()) {
                assert!((i16::from(*got) - i16::from(*want)).abs() <= 10);
            }
        }
    }

    #[test]
    fn approximate_color_is_seed_stable() {
        let mut a = ChaCha8Rng::seed_from_u64(9);
        let mut b = ChaCha8Rng::seed_from_u64(9);
        let base = Rgb::new(50, 200, 30);
        assert_eq!(
            approximate_color(base, 10, &mut a),
            approximate_color(base, 10, &mut b)
        );
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let table = MaterialTable::standard();
        table.save(tmp.path()).unwrap();

        let loaded = MaterialTable::load(tmp.path()).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(
            loaded.swatch(LEAF).unwrap(),
            table.swatch(LEAF).unwrap()
        );
    }
}

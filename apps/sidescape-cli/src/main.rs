use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sidescape_assets::{LEAF, MaterialTable, TRUNK};
use sidescape_common::{Tag, WorldConfig};
use sidescape_flora::{LeafLifecycle, TreeBuilder, TreePlacer};
use sidescape_kernel::{Animator, World};
use sidescape_stream::Session;
use sidescape_terrain::HeightMap;
use sidescape_tools::WorldInspector;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sidescape-cli", about = "Sample and simulate the sidescape world generator")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON world config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON material table (defaults to the standard palette)
    #[arg(long)]
    materials: Option<PathBuf>,

    /// World seed
    #[arg(long)]
    seed: Option<i64>,

    /// Window width in world units
    #[arg(long)]
    width: Option<f32>,

    /// Window height in world units
    #[arg(long)]
    height: Option<f32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the effective config
    Info,
    /// Print the ground height for a range of x
    Heights {
        #[arg(long, default_value = "-810", allow_hyphen_values = true)]
        from: f32,
        #[arg(long, default_value = "1590", allow_hyphen_values = true)]
        to: f32,
        #[arg(long, default_value = "30")]
        step: f32,
    },
    /// List the trees standing in a range
    Trees {
        #[arg(long, default_value = "-810", allow_hyphen_values = true)]
        from: f32,
        #[arg(long, default_value = "1590", allow_hyphen_values = true)]
        to: f32,
    },
    /// Walk the viewpoint across the world and report what streamed
    Walk {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "600")]
        ticks: u64,
        /// Viewpoint speed in units per second (negative walks left)
        #[arg(short, long, default_value = "300", allow_hyphen_values = true)]
        speed: f32,
        /// Frame delta in seconds
        #[arg(long, default_value = "0.0166667")]
        dt: f32,
    },
    /// Write the standard material table to a JSON file
    Palette {
        #[arg(short, long)]
        out: PathBuf,
    },
}

impl Cli {
    fn world_config(&self) -> anyhow::Result<WorldConfig> {
        let mut config = match &self.config {
            Some(path) => WorldConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => WorldConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        config.validate()?;
        Ok(config)
    }

    fn material_table(&self) -> anyhow::Result<MaterialTable> {
        match &self.materials {
            Some(path) => MaterialTable::load(path)
                .with_context(|| format!("loading materials {}", path.display())),
            None => Ok(MaterialTable::standard()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.world_config()?;

    match &cli.command {
        Commands::Info => {
            println!("sidescape-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", sidescape_common::crate_info());
            println!("kernel: {}", sidescape_kernel::crate_info());
            println!("assets: {}", sidescape_assets::crate_info());
            println!("terrain: {}", sidescape_terrain::crate_info());
            println!("flora: {}", sidescape_flora::crate_info());
            println!("stream: {}", sidescape_stream::crate_info());
            println!("tools: {}", sidescape_tools::crate_info());
            println!("config: {}", serde_json::to_string(&config)?);
        }
        Commands::Heights { from, to, step } => {
            anyhow::ensure!(*step > 0.0, "step must be positive");
            let heights = HeightMap::new(&config);
            let mut x = *from;
            while x < *to {
                println!("{x}\t{}", heights.ground_height_at(x));
                x += step;
            }
        }
        Commands::Trees { from, to } => {
            let materials = cli.material_table()?;
            let heights = HeightMap::new(&config);
            let builder = TreeBuilder::new(heights, materials.swatch(TRUNK)?, materials.swatch(LEAF)?);
            let mut placer = TreePlacer::new(builder);
            let mut world = World::new();
            let mut animator = Animator::new();
            let mut leaves = LeafLifecycle::new(config.seed);
            let built = placer.create_in_range(&mut world, &mut animator, &mut leaves, *from, *to);

            println!("x\tground\ttrunk\tleaves");
            for x in placer.slots(*from, *to).filter(|x| placer.is_place_tree(*x)) {
                let trunk = placer.builder().cached_trunk_height(x).unwrap_or(0.0);
                let canopy = leaves_of(&world, &leaves, x);
                println!("{x}\t{}\t{trunk}\t{canopy}", heights.ground_height_at(x));
            }
            println!("{built} trees, spacing {}", placer.spacing());
        }
        Commands::Walk { ticks, speed, dt } => {
            let materials = cli.material_table()?;
            let mut session = Session::new(config, &materials)?;
            let mut x = config.window.midpoint_x();
            let mut shifts = 0;
            let mut evicted = 0;
            for tick in 0..*ticks {
                x += speed * dt;
                let stats = session.tick(x, *dt);
                shifts += stats.shifts.abs();
                evicted += stats.evicted;
                if stats.extended() {
                    let range = session.streamer().range();
                    tracing::info!(tick, x, min_x = range.min_x, max_x = range.max_x, "range shifted");
                }
            }
            println!("{}", WorldInspector::summary(session.world()));
            println!("{}", WorldInspector::leaf_census(session.leaves()));
            println!(
                "viewpoint={x:.1} shifts={shifts} evicted={evicted} landed={}",
                session.landed()
            );
            println!(
                "frame avg={:?} max={:?}",
                session.timer().average(),
                session.timer().max()
            );
            println!("state hash: {:#018x}", session.world().state_hash());
        }
        Commands::Palette { out } => {
            let table = MaterialTable::standard();
            table
                .save(out)
                .with_context(|| format!("writing {}", out.display()))?;
            println!("wrote {} materials to {}", table.len(), out.display());
        }
    }

    Ok(())
}

fn leaves_of(world: &World, leaves: &LeafLifecycle, anchor: f32) -> usize {
    WorldInspector::list_tagged(world, Tag::Leaf)
        .into_iter()
        .filter(|id| leaves.anchor(*id) == Some(anchor))
        .count()
}

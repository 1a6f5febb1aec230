use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use zenmosaic::{
    run_batch, BatchOptions, BatchReport, BlockOptions, HexOptions, Pipeline, VoronoiOptions,
};

#[derive(Parser, Debug)]
#[command(
    name = "zenmosaic",
    version,
    about = "Dominant-palette blocks and mosaic renders for sprite folders"
)]
struct Cli {
    /// Directory of PNG sprites to process
    src_dir: PathBuf,

    /// Which output to render
    #[arg(long, value_enum, default_value = "blocks")]
    mode: Mode,

    /// Output directory (default: sibling <src>_colours)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Clusters to extract (default: 10 for blocks, 8 for mosaics)
    #[arg(long)]
    colors: Option<usize>,

    /// Alpha a pixel must exceed to count toward the palette
    /// (default: 0 for blocks, 128 for mosaics)
    #[arg(long)]
    alpha_floor: Option<u8>,

    /// Reduce the merged palette to this many blocks
    #[arg(long)]
    num_blocks: Option<usize>,

    /// Lab distance for folding similar clusters together
    #[arg(long, default_value_t = 3.0)]
    threshold: f32,

    /// Lab distance for skipping near-duplicate summary names
    #[arg(long, default_value_t = 3.0)]
    dedupe_threshold: f32,

    /// Block canvas width in pixels
    #[arg(long, default_value_t = 1000)]
    width: u32,

    /// Block canvas height in pixels
    #[arg(long, default_value_t = 500)]
    height: u32,

    /// Hexagon cell size in pixels
    #[arg(long, default_value_t = 8)]
    cell_size: u32,

    /// Shuffle hexagon colors instead of keeping them in place
    #[arg(long)]
    shuffle: bool,

    /// Let hexagons overflow the sprite silhouette
    #[arg(long)]
    vague_shape: bool,

    /// Transparent padding around the sprite before the hex resize
    #[arg(long, default_value_t = 0)]
    padding: u32,

    /// Blur sigma applied to the hex canvas before sampling
    #[arg(long, default_value_t = 0.0)]
    blur: f32,

    /// Voronoi site count
    #[arg(long, default_value_t = 50)]
    points: usize,

    /// Voronoi edge extension distance in pixels (0 disables)
    #[arg(long, default_value_t = 20.0)]
    extend: f64,

    /// CSV of id,name display names for the summary
    #[arg(long)]
    names: Option<PathBuf>,

    /// Process only the first N sprites
    #[arg(long)]
    limit: Option<usize>,

    /// Save block images as JPEG
    #[arg(long)]
    jpg: bool,

    /// Seed for site sampling, shuffling and edge masking
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Blocks,
    Hex,
    Voronoi,
}

impl From<Mode> for Pipeline {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Blocks => Pipeline::Blocks,
            Mode::Hex => Pipeline::Hex,
            Mode::Voronoi => Pipeline::Voronoi,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(report) if report.all_ok() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<BatchReport> {
    let opts = BatchOptions {
        pipeline: cli.mode.into(),
        output_dir: cli.output_dir.clone(),
        colors: cli.colors,
        block_count: cli.num_blocks,
        merge_threshold: cli.threshold,
        dedupe_threshold: cli.dedupe_threshold,
        alpha_floor: cli.alpha_floor,
        block: BlockOptions::new().width(cli.width).height(cli.height),
        hex: HexOptions::new()
            .cell_size(cli.cell_size)
            .shuffle(cli.shuffle)
            .keep_silhouette(!cli.vague_shape)
            .padding(cli.padding)
            .blur(cli.blur),
        voronoi: VoronoiOptions::new().sites(cli.points).extend(cli.extend),
        names_file: cli.names.clone(),
        limit: cli.limit,
        jpg_blocks: cli.jpg,
    };

    let mut rng = match cli.seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };

    run_batch(&cli.src_dir, &opts, &mut rng)
        .with_context(|| format!("processing {}", cli.src_dir.display()))
}

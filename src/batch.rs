//! Directory-level driver: one pipeline applied to every sprite in a folder.
//!
//! A run owns a source directory of PNG sprites and an output directory
//! (default the sibling `<src>_colours`). Sprites are processed one at a
//! time; a failing sprite is logged and recorded without stopping the rest.
//! The blocks pipeline additionally accumulates one summary row per sprite
//! and writes `colours.csv` after the loop.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, log_enabled, warn, Level};
use rand::Rng;
use serde::Deserialize;

use crate::blocks::{self, BlockOptions};
use crate::cluster::{self, Cluster};
use crate::error::MosaicError;
use crate::extract::{extract_palette, ExtractOptions};
use crate::hex::{self, HexOptions};
use crate::mask;
use crate::namer;
use crate::summary::{self, SummaryRow};
use crate::voronoi::{self, VoronoiOptions};

/// Which renderer a batch run drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    /// Proportional color blocks plus the `colours.csv` summary.
    Blocks,
    /// Hexagonal mosaic at a padded working resolution.
    Hex,
    /// Voronoi mosaic at native resolution.
    Voronoi,
}

/// Everything a batch run needs beyond the source directory.
///
/// `colors: None` picks the pipeline's own cluster count (10 for blocks,
/// 8 for the mosaics). The per-renderer options are passed through as-is.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub pipeline: Pipeline,
    /// Output directory; `None` means the sibling `<src>_colours`.
    pub output_dir: Option<PathBuf>,
    /// Cluster count override for the extractor.
    pub colors: Option<usize>,
    /// Reduce the merged palette to this many blocks; `None` keeps all.
    pub block_count: Option<usize>,
    /// Lab distance below which extracted clusters are folded together.
    pub merge_threshold: f32,
    /// Lab distance below which a summary candidate repeats an accepted one.
    pub dedupe_threshold: f32,
    /// Alpha a pixel must exceed to count toward the palette; `None` keeps
    /// the pipeline default (0 for blocks, 128 for the mosaics).
    pub alpha_floor: Option<u8>,
    pub block: BlockOptions,
    pub hex: HexOptions,
    pub voronoi: VoronoiOptions,
    /// Optional `id,name` CSV supplying the display-name column.
    pub names_file: Option<PathBuf>,
    /// Process only the first N sprites in sorted order.
    pub limit: Option<usize>,
    /// Save block images as JPEG instead of PNG.
    pub jpg_blocks: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pipeline: Pipeline::Blocks,
            output_dir: None,
            colors: None,
            block_count: None,
            merge_threshold: 3.0,
            dedupe_threshold: 3.0,
            alpha_floor: None,
            block: BlockOptions::default(),
            hex: HexOptions::default(),
            voronoi: VoronoiOptions::default(),
            names_file: None,
            limit: None,
            jpg_blocks: false,
        }
    }
}

impl BatchOptions {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            ..Self::default()
        }
    }
}

/// Outcome of a batch run. `failed` holds the sprite ids that were skipped
/// and the error each one hit; failures never abort the run.
#[derive(Debug)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: Vec<(String, MosaicError)>,
}

impl BatchReport {
    pub fn all_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Processes every PNG in `src_dir` through the configured pipeline.
///
/// Creates the output directory, walks the sorted file list, and keeps going
/// past per-sprite failures. Returns the report; errors are only propagated
/// for run-level problems (unreadable directory, unwritable summary).
pub fn run_batch(
    src_dir: &Path,
    opts: &BatchOptions,
    rng: &mut impl Rng,
) -> Result<BatchReport, MosaicError> {
    let out_dir = match &opts.output_dir {
        Some(dir) => dir.clone(),
        None => default_output_dir(src_dir),
    };
    fs::create_dir_all(&out_dir)?;

    let files = png_files(src_dir, opts.limit)?;
    info!(
        "Processing {} sprites from {} into {}",
        files.len(),
        src_dir.display(),
        out_dir.display()
    );

    let names = match &opts.names_file {
        Some(path) => load_names(path)?,
        None => HashMap::new(),
    };

    let mut rows: Vec<SummaryRow> = Vec::new();
    let mut report = BatchReport {
        processed: 0,
        failed: Vec::new(),
    };

    for path in &files {
        let id = file_stem(path);
        match process_one(path, &id, &out_dir, opts, &names, rng) {
            Ok(row) => {
                report.processed += 1;
                if let Some(row) = row {
                    rows.push(row);
                }
            }
            Err(err) => {
                warn!("Skipping {id}: {err}");
                report.failed.push((id, err));
            }
        }
    }

    if opts.pipeline == Pipeline::Blocks {
        summary::write_csv(&out_dir.join("colours.csv"), &rows)?;
    }

    if report.all_ok() {
        info!("Finished: {} sprites processed", report.processed);
    } else {
        let ids: Vec<&str> = report.failed.iter().map(|(id, _)| id.as_str()).collect();
        warn!(
            "Finished: {} processed, {} failed ({})",
            report.processed,
            report.failed.len(),
            ids.join(", ")
        );
    }
    Ok(report)
}

fn process_one(
    path: &Path,
    id: &str,
    out_dir: &Path,
    opts: &BatchOptions,
    names: &HashMap<String, String>,
    rng: &mut impl Rng,
) -> Result<Option<SummaryRow>, MosaicError> {
    let img = image::open(path)?.to_rgba8();

    match opts.pipeline {
        Pipeline::Blocks => {
            let palette = extract_palette(&img, &block_profile(opts))?;
            log_clusters(id, "extracted", &palette);
            let merged = cluster::merge_similar(&palette, opts.merge_threshold);
            let reduced = cluster::reduce_to_n(&merged, opts.block_count.unwrap_or(0));
            log_clusters(id, "merged", &reduced);

            let rendered = blocks::render_blocks(&reduced, &opts.block)?;
            let ext = if opts.jpg_blocks { "jpg" } else { "png" };
            rendered.save(out_dir.join(format!("{id}.{ext}")))?;

            let picked = summary::select_names(&reduced, opts.dedupe_threshold);
            let display = names.get(id).map(String::as_str).unwrap_or("");
            Ok(Some(SummaryRow::new(id, display, &picked)))
        }
        Pipeline::Hex => {
            let canvas = hex::prepare_canvas(&img, &opts.hex)?;
            let palette = extract_palette(&canvas, &mosaic_profile(opts))?;
            let mosaic = hex::render_hex(&canvas, &palette, &opts.hex, rng)?;
            mosaic.save(out_dir.join(format!("{id}.png")))?;
            Ok(None)
        }
        Pipeline::Voronoi => {
            let palette = extract_palette(&img, &mosaic_profile(opts))?;
            let mosaic = voronoi::render_voronoi(&img, &palette, &opts.voronoi, rng)?;
            mosaic.save(out_dir.join(format!("{id}.png")))?;
            Ok(None)
        }
    }
}

/// Extractor settings for the blocks/summary pipeline: a wider palette over
/// a downsampled canvas, with the near-black floor screening artifacts.
fn block_profile(opts: &BatchOptions) -> ExtractOptions {
    let profile = ExtractOptions::new().k(opts.colors.unwrap_or(10));
    match opts.alpha_floor {
        Some(floor) => profile.alpha_floor(floor),
        None => profile,
    }
}

/// Extractor settings for the mosaic pipelines: native resolution, opaque
/// pixels only, no near-black floor, more restarts.
fn mosaic_profile(opts: &BatchOptions) -> ExtractOptions {
    ExtractOptions::new()
        .k(opts.colors.unwrap_or(8))
        .working_size(None)
        .alpha_floor(opts.alpha_floor.unwrap_or(mask::OPAQUE_ALPHA))
        .rgb_sum_floor(None)
        .runs(10)
}

fn log_clusters(id: &str, stage: &str, clusters: &[Cluster]) {
    if !log_enabled!(Level::Debug) {
        return;
    }
    let total = cluster::total_weight(clusters).max(1);
    for c in clusters {
        debug!(
            "{id} {stage}: #{:02x}{:02x}{:02x} weight {} ({:.1}%) {}",
            c.rgb[0],
            c.rgb[1],
            c.rgb[2],
            c.weight,
            c.weight as f64 * 100.0 / total as f64,
            namer::name_of(c.rgb),
        );
    }
}

/// Sorted `*.png` paths directly under `dir`, optionally truncated.
fn png_files(dir: &Path, limit: Option<usize>) -> Result<Vec<PathBuf>, MosaicError> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_png = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("png"))
            .unwrap_or(false);
        if is_png && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct NameRecord {
    id: String,
    name: String,
}

/// Reads the optional display-name table, a headered `id,name` CSV.
fn load_names(path: &Path) -> Result<HashMap<String, String>, MosaicError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut names = HashMap::new();
    for record in reader.deserialize() {
        let NameRecord { id, name } = record?;
        names.insert(id, name);
    }
    Ok(names)
}

fn default_output_dir(src: &Path) -> PathBuf {
    let base = src
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sprites".to_string());
    src.with_file_name(format!("{base}_colours"))
}

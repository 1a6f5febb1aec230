//! Perceptual color clustering and mosaic synthesis for sprite assets.
//!
//! The crate extracts a dominant palette from an image (k-means over
//! eligible pixels, counted per centroid), optionally folds perceptually
//! similar clusters together, and renders the result three ways:
//! proportional color blocks, a hexagonal mosaic, or a Voronoi mosaic with
//! an irregular alpha edge. [`batch`] drives a directory of sprites through
//! one of those pipelines and writes a `colours.csv` name summary.

#![forbid(unsafe_code)]

pub mod batch;
pub mod blocks;
pub mod cluster;
pub mod draw;
pub mod error;
pub mod extract;
pub mod hex;
pub mod lab;
pub mod mask;
pub mod namer;
pub mod summary;
pub mod voronoi;

pub use batch::{run_batch, BatchOptions, BatchReport, Pipeline};
pub use blocks::{render_blocks, BlockOptions};
pub use cluster::{merge_similar, reduce_to_n, Cluster};
pub use error::MosaicError;
pub use extract::{extract_palette, ExtractOptions};
pub use hex::{prepare_canvas, render_hex, HexOptions};
pub use lab::{is_similar, Lab};
pub use namer::name_of;
pub use summary::{select_names, write_csv, SummaryRow};
pub use voronoi::{render_voronoi, VoronoiOptions};

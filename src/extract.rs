use std::collections::BTreeMap;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use kmeans_colors::{get_kmeans, Kmeans};
use palette::Srgb;

use crate::cluster::{sort_by_weight, Cluster};
use crate::error::MosaicError;

/// Palette extraction parameters.
///
/// Eligibility: a pixel enters the sample set iff `alpha > alpha_floor` and,
/// when `rgb_sum_floor` is set, `r + g + b > floor`. The sum floor screens
/// out compression-artifact near-black pixels that would otherwise dominate
/// sprite clusters.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Number of clusters to produce (1..=256).
    pub k: usize,
    /// Square working resolution for clustering; `None` clusters at native size.
    pub working_size: Option<u32>,
    /// Pixels with alpha at or below this are ignored.
    pub alpha_floor: u8,
    /// Pixels whose channel sum is at or below this are ignored. `None` disables.
    pub rgb_sum_floor: Option<u16>,
    /// K-means restarts; the lowest-score run wins.
    pub runs: u32,
    /// Iteration cap per k-means run.
    pub max_iter: usize,
    /// Convergence threshold per k-means run (sRGB 0..1 scale).
    pub converge: f32,
    /// Base seed; restart `i` runs with `seed + i`.
    pub seed: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            k: 8,
            working_size: Some(256),
            alpha_floor: 0,
            rgb_sum_floor: Some(30),
            runs: 5,
            max_iter: 20,
            converge: 0.0025,
            seed: 42,
        }
    }
}

impl ExtractOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn working_size(mut self, edge: Option<u32>) -> Self {
        self.working_size = edge;
        self
    }

    pub fn alpha_floor(mut self, floor: u8) -> Self {
        self.alpha_floor = floor;
        self
    }

    pub fn rgb_sum_floor(mut self, floor: Option<u16>) -> Self {
        self.rgb_sum_floor = floor;
        self
    }

    pub fn runs(mut self, runs: u32) -> Self {
        self.runs = runs;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// Extract the dominant palette of an image.
///
/// Downsamples to the working resolution, collects eligible pixels, clusters
/// them with restarted k-means, and counts the converged assignment per
/// centroid. Returns exactly `k` clusters sorted by descending weight; the
/// weights sum to the eligible-pixel count.
///
/// Degenerate inputs never fail: an image with no eligible pixels yields `k`
/// zero-weight white entries, and an image with fewer distinct eligible
/// colors than `k` yields those colors with exact counts, padded to `k` with
/// zero-weight copies of the dominant color.
pub fn extract_palette(
    image: &RgbaImage,
    opts: &ExtractOptions,
) -> Result<Vec<Cluster>, MosaicError> {
    if opts.k == 0 || opts.k > 256 {
        return Err(MosaicError::InvalidClusterCount(opts.k));
    }

    let resized;
    let source = match opts.working_size {
        Some(edge) => {
            resized = imageops::resize(image, edge, edge, FilterType::Lanczos3);
            &resized
        }
        None => image,
    };

    let samples = eligible_pixels(source, opts);
    if samples.is_empty() {
        return Ok(vec![Cluster::new([255, 255, 255], 0); opts.k]);
    }

    // Exact counting when the image has no more distinct colors than clusters.
    // K-means would converge onto those colors anyway, and its initialization
    // needs more distinct points than centroids.
    let mut counts: BTreeMap<[u8; 3], u64> = BTreeMap::new();
    for rgb in &samples {
        *counts.entry(*rgb).or_insert(0) += 1;
    }
    let mut clusters = if counts.len() <= opts.k {
        counts
            .into_iter()
            .map(|(rgb, weight)| Cluster::new(rgb, weight))
            .collect()
    } else {
        run_kmeans(&samples, opts)
    };

    sort_by_weight(&mut clusters);
    while clusters.len() < opts.k {
        clusters.push(Cluster::new(clusters[0].rgb, 0));
    }
    Ok(clusters)
}

fn eligible_pixels(image: &RgbaImage, opts: &ExtractOptions) -> Vec<[u8; 3]> {
    let mut out = Vec::new();
    for px in image.pixels() {
        let [r, g, b, a] = px.0;
        if a <= opts.alpha_floor {
            continue;
        }
        if let Some(floor) = opts.rgb_sum_floor {
            if r as u16 + g as u16 + b as u16 <= floor {
                continue;
            }
        }
        out.push([r, g, b]);
    }
    out
}

fn run_kmeans(samples: &[[u8; 3]], opts: &ExtractOptions) -> Vec<Cluster> {
    let buffer: Vec<Srgb<f32>> = samples
        .iter()
        .map(|&[r, g, b]| Srgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0))
        .collect();

    let mut best = Kmeans::new();
    for i in 0..opts.runs.max(1) {
        let run = get_kmeans(
            opts.k,
            opts.max_iter,
            opts.converge,
            false,
            &buffer,
            opts.seed + i as u64,
        );
        if run.score < best.score {
            best = run;
        }
    }

    let mut weights = vec![0u64; opts.k];
    for &idx in &best.indices {
        weights[idx as usize] += 1;
    }

    best.centroids
        .iter()
        .zip(weights)
        .map(|(&centroid, weight)| {
            let rgb: Srgb<u8> = centroid.into_format();
            Cluster::new([rgb.red, rgb.green, rgb.blue], weight)
        })
        .collect()
}

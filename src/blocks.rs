//! Proportional color-block strips.
//!
//! Renders ranked clusters as vertical blocks whose widths are
//! proportional to cluster weight, on a fixed-size white canvas.

use image::{Rgb, RgbImage};

use crate::cluster::Cluster;
use crate::error::MosaicError;

/// Canvas geometry for the block strip.
#[derive(Debug, Clone)]
pub struct BlockOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for BlockOptions {
    fn default() -> Self {
        BlockOptions {
            width: 1000,
            height: 500,
        }
    }
}

impl BlockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }
}

/// Splits `total_width` columns across clusters proportionally to weight.
///
/// Widths are floored, every block is bumped to at least one column, and
/// leftover columns go to the largest fractional remainders first. When
/// the minimum-width bumps overcommit the canvas the deficit is taken
/// back from the widest blocks, never below one column, so the result
/// sums to `total_width` whenever the palette fits the canvas.
pub fn allocate_widths(weights: &[u64], total_width: u32) -> Vec<u32> {
    if weights.is_empty() {
        return Vec::new();
    }
    let total: u64 = weights.iter().sum();
    if total == 0 {
        // Equal split, last block absorbs the rounding slack.
        let n = weights.len() as u32;
        let base = total_width / n;
        let mut widths = vec![base; weights.len()];
        let filled = base * (n - 1);
        widths[weights.len() - 1] = total_width - filled;
        return widths;
    }

    let float_widths: Vec<f64> = weights
        .iter()
        .map(|&w| w as f64 / total as f64 * total_width as f64)
        .collect();
    let mut widths: Vec<i64> = float_widths.iter().map(|&w| w as i64).collect();
    // Fractional parts before the minimum-width bumps, so distribution
    // order still reflects the true remainders.
    let fracs: Vec<f64> = float_widths
        .iter()
        .zip(&widths)
        .map(|(&w, &f)| w - f as f64)
        .collect();
    for w in &mut widths {
        if *w < 1 {
            *w = 1;
        }
    }
    let mut remaining = total_width as i64 - widths.iter().sum::<i64>();

    if remaining > 0 {
        let mut order: Vec<usize> = (0..widths.len()).collect();
        order.sort_by(|&a, &b| {
            fracs[b]
                .partial_cmp(&fracs[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for i in 0..remaining as usize {
            widths[order[i % order.len()]] += 1;
        }
    } else {
        while remaining < 0 {
            let mut widest = 0usize;
            for (i, &w) in widths.iter().enumerate() {
                if w > widths[widest] {
                    widest = i;
                }
            }
            if widths[widest] <= 1 {
                break;
            }
            widths[widest] -= 1;
            remaining += 1;
        }
    }

    widths.into_iter().map(|w| w as u32).collect()
}

/// Renders clusters as a block strip. Blocks appear in the given order,
/// widest-weight first when the input is ranked.
pub fn render_blocks(clusters: &[Cluster], opts: &BlockOptions) -> Result<RgbImage, MosaicError> {
    if opts.width == 0 || opts.height == 0 {
        return Err(MosaicError::ZeroCanvas);
    }
    let weights: Vec<u64> = clusters.iter().map(|c| c.weight).collect();
    let widths = allocate_widths(&weights, opts.width);

    let mut img = RgbImage::from_pixel(opts.width, opts.height, Rgb([255, 255, 255]));
    let mut x_start = 0u32;
    for (cluster, &width) in clusters.iter().zip(&widths) {
        // Minimum widths can spill past the canvas when there are more
        // clusters than columns; the overflow is simply not drawn.
        let x_end = (x_start + width).min(opts.width);
        for x in x_start..x_end {
            for y in 0..opts.height {
                img.put_pixel(x, y, Rgb(cluster.rgb));
            }
        }
        x_start = x_end;
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_proportions_split_cleanly() {
        assert_eq!(allocate_widths(&[750, 250], 1000), vec![750, 250]);
    }

    #[test]
    fn remainder_goes_to_largest_fractions_first() {
        // Equal thirds of 1000: fractions tie, the earliest block wins.
        assert_eq!(allocate_widths(&[1, 1, 1], 1000), vec![334, 333, 333]);
    }

    #[test]
    fn zero_total_weight_falls_back_to_equal_widths() {
        let widths = allocate_widths(&[0, 0, 0], 1000);
        assert_eq!(widths, vec![333, 333, 334]);
        assert_eq!(widths.iter().sum::<u32>(), 1000);
    }

    #[test]
    fn tiny_weights_keep_a_visible_column() {
        let widths = allocate_widths(&[100_000, 1], 1000);
        assert_eq!(widths, vec![999, 1]);
    }

    #[test]
    fn overcommitted_minimums_reclaim_from_the_widest() {
        let widths = allocate_widths(&[100, 1, 1], 10);
        assert_eq!(widths, vec![8, 1, 1]);
        assert_eq!(widths.iter().sum::<u32>(), 10);
    }

    #[test]
    fn more_clusters_than_columns_never_drops_a_block() {
        let widths = allocate_widths(&[1; 20], 10);
        assert_eq!(widths.len(), 20);
        assert!(widths.iter().all(|&w| w >= 1));

        let clusters: Vec<Cluster> = (0..20u8).map(|i| Cluster::new([i, i, i], 1)).collect();
        let opts = BlockOptions::new().width(10).height(4);
        let img = render_blocks(&clusters, &opts).unwrap();
        assert_eq!(img.dimensions(), (10, 4));
    }

    #[test]
    fn widths_always_sum_to_the_canvas() {
        for weights in [
            vec![3u64, 5, 7, 11, 13],
            vec![1, 1, 1, 1, 1, 1, 1],
            vec![1_000_000, 3, 2, 1],
        ] {
            let widths = allocate_widths(&weights, 1000);
            assert_eq!(widths.iter().sum::<u32>(), 1000, "weights {weights:?}");
        }
    }

    #[test]
    fn empty_palette_renders_a_white_canvas() {
        let opts = BlockOptions::new().width(20).height(10);
        let img = render_blocks(&[], &opts).unwrap();
        assert_eq!(img.dimensions(), (20, 10));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn zero_weight_fallback_palette_renders_at_full_size() {
        // The extractor's no-eligible-pixels palette: all white, zero weight.
        let fallback = vec![Cluster::new([255, 255, 255], 0); 8];
        let img = render_blocks(&fallback, &BlockOptions::new()).unwrap();
        assert_eq!(img.dimensions(), (1000, 500));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn blocks_are_laid_out_in_cluster_order() {
        let clusters = [
            Cluster::new([200, 0, 0], 600),
            Cluster::new([0, 0, 200], 400),
        ];
        let opts = BlockOptions::new();
        let img = render_blocks(&clusters, &opts).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [200, 0, 0]);
        assert_eq!(img.get_pixel(599, 499).0, [200, 0, 0]);
        assert_eq!(img.get_pixel(600, 0).0, [0, 0, 200]);
        assert_eq!(img.get_pixel(999, 499).0, [0, 0, 200]);
    }

    #[test]
    fn zero_canvas_is_rejected() {
        let opts = BlockOptions::new().width(0);
        assert!(matches!(
            render_blocks(&[], &opts),
            Err(MosaicError::ZeroCanvas)
        ));
    }
}

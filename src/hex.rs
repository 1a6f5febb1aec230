//! Hexagonal mosaic synthesis.
//!
//! Tiles the sprite with flat-top hexagons, paints each cell with the
//! dominant color nearest its neighborhood average, and clips the result
//! to a slightly dilated silhouette of the sprite.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::cluster::{self, Cluster};
use crate::draw;
use crate::error::MosaicError;
use crate::mask;

/// Settings for the hexagonal mosaic.
#[derive(Debug, Clone)]
pub struct HexOptions {
    /// Cell diameter in pixels.
    pub cell_size: u32,
    /// Reassign cell colors randomly while keeping cell positions.
    pub shuffle: bool,
    /// Clip the mosaic to the dilated sprite silhouette. When false the
    /// hexagons keep their full blocky outline.
    pub keep_silhouette: bool,
    /// Transparent margin added around the sprite before resizing.
    pub padding: u32,
    /// Gaussian blur sigma applied to the working canvas, zero to skip.
    pub blur: f32,
    /// Square working resolution the sprite is resampled to.
    pub working_size: u32,
}

impl Default for HexOptions {
    fn default() -> Self {
        HexOptions {
            cell_size: 8,
            shuffle: false,
            keep_silhouette: true,
            padding: 0,
            blur: 0.0,
            working_size: 700,
        }
    }
}

impl HexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell_size(mut self, cell_size: u32) -> Self {
        self.cell_size = cell_size;
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn keep_silhouette(mut self, keep: bool) -> Self {
        self.keep_silhouette = keep;
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn blur(mut self, blur: f32) -> Self {
        self.blur = blur;
        self
    }

    pub fn working_size(mut self, size: u32) -> Self {
        self.working_size = size;
        self
    }
}

/// Pads, resamples, and optionally blurs the sprite into the square
/// working canvas the mosaic is built on.
pub fn prepare_canvas(img: &RgbaImage, opts: &HexOptions) -> Result<RgbaImage, MosaicError> {
    if opts.working_size == 0 {
        return Err(MosaicError::ZeroCanvas);
    }
    let padded = if opts.padding > 0 {
        let (w, h) = img.dimensions();
        let mut canvas = RgbaImage::new(w + 2 * opts.padding, h + 2 * opts.padding);
        imageops::replace(&mut canvas, img, opts.padding as i64, opts.padding as i64);
        canvas
    } else {
        img.clone()
    };
    let mut working = imageops::resize(
        &padded,
        opts.working_size,
        opts.working_size,
        FilterType::Lanczos3,
    );
    if opts.blur > 0.0 {
        working = imageops::blur(&working, opts.blur);
    }
    Ok(working)
}

/// Renders the hexagonal mosaic over an already prepared canvas.
pub fn render_hex(
    img: &RgbaImage,
    palette: &[Cluster],
    opts: &HexOptions,
    rng: &mut impl Rng,
) -> Result<RgbaImage, MosaicError> {
    if opts.cell_size == 0 {
        return Err(MosaicError::InvalidCellSize(opts.cell_size));
    }
    if palette.is_empty() {
        return Err(MosaicError::InvalidClusterCount(0));
    }
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(MosaicError::ZeroCanvas);
    }

    let radius = opts.cell_size as f64 / 2.0;
    let hex_width = radius * 2.0;
    let hex_height = radius * 3.0f64.sqrt();
    // Flat-top tessellation: columns sit three quarters of a cell apart,
    // odd columns drop by half a cell.
    let horiz_spacing = hex_width * 0.75;
    let vert_spacing = hex_height;

    let mut cells: Vec<(f64, f64, [u8; 3])> = Vec::new();
    let mut col = 0u64;
    let mut x = 0.0f64;
    while x < width as f64 + hex_width {
        let mut y = if col % 2 == 1 { hex_height / 2.0 } else { 0.0 };
        while y < height as f64 + hex_height {
            if let Some(color) = sample_cell(img, palette, x, y, radius) {
                cells.push((x, y, color));
            }
            y += vert_spacing;
        }
        x += horiz_spacing;
        col += 1;
    }

    if opts.shuffle {
        let mut colors: Vec<[u8; 3]> = cells.iter().map(|cell| cell.2).collect();
        colors.shuffle(rng);
        for (cell, color) in cells.iter_mut().zip(colors) {
            cell.2 = color;
        }
    }

    let mut mosaic = RgbaImage::new(width, height);
    for &(cx, cy, color) in &cells {
        let vertices = hexagon_vertices(cx, cy, radius);
        draw::fill_polygon(
            &mut mosaic,
            &vertices,
            Rgba([color[0], color[1], color[2], 255]),
        );
    }

    if opts.keep_silhouette {
        let alpha = mask::opaque_mask(img, mask::OPAQUE_ALPHA);
        let dilated = mask::dilate(&alpha, width as usize, height as usize, 3);
        mask::apply_silhouette(&mut mosaic, &dilated);
    }
    Ok(mosaic)
}

/// Averages the opaque pixels around a cell center and snaps the result
/// to the nearest palette color. Returns None for cells whose centers
/// fall outside the canvas or whose neighborhoods are mostly transparent.
fn sample_cell(
    img: &RgbaImage,
    palette: &[Cluster],
    center_x: f64,
    center_y: f64,
    radius: f64,
) -> Option<[u8; 3]> {
    let (width, height) = img.dimensions();
    let sample_x = center_x as i64;
    let sample_y = center_y as i64;
    if sample_x < 0 || sample_x >= width as i64 || sample_y < 0 || sample_y >= height as i64 {
        return None;
    }

    let sample_size = (radius as i64).max(1);
    let x_start = (sample_x - sample_size).max(0) as u32;
    let x_end = ((sample_x + sample_size) as u32).min(width);
    let y_start = (sample_y - sample_size).max(0) as u32;
    let y_end = ((sample_y + sample_size) as u32).min(height);

    let mut alpha_sum = 0u64;
    let mut pixel_count = 0u64;
    let mut opaque_count = 0u64;
    let mut rgb_sum = [0.0f64; 3];
    for y in y_start..y_end {
        for x in x_start..x_end {
            let p = img.get_pixel(x, y);
            alpha_sum += p.0[3] as u64;
            pixel_count += 1;
            if p.0[3] > mask::OPAQUE_ALPHA {
                opaque_count += 1;
                rgb_sum[0] += p.0[0] as f64;
                rgb_sum[1] += p.0[1] as f64;
                rgb_sum[2] += p.0[2] as f64;
            }
        }
    }
    if pixel_count == 0 || opaque_count == 0 {
        return None;
    }
    if (alpha_sum as f64 / pixel_count as f64) < mask::OPAQUE_ALPHA as f64 {
        return None;
    }

    let average = [
        rgb_sum[0] / opaque_count as f64,
        rgb_sum[1] / opaque_count as f64,
        rgb_sum[2] / opaque_count as f64,
    ];
    cluster::nearest_rgb(palette, average)
}

/// Vertices of a flat-top hexagon, starting from the upper-left vertex.
fn hexagon_vertices(center_x: f64, center_y: f64, radius: f64) -> [(f64, f64); 6] {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_6, PI};
    let mut vertices = [(0.0, 0.0); 6];
    for (i, vertex) in vertices.iter_mut().enumerate() {
        let angle = PI / 3.0 * i as f64 + FRAC_PI_6 + FRAC_PI_2;
        *vertex = (
            center_x + radius * angle.cos(),
            center_y + radius * angle.sin(),
        );
    }
    vertices
}

//! Alpha-mask utilities: silhouette clipping, dilation, and the
//! distance field used for irregular edge extension.
//!
//! Masks are flat row-major `Vec<bool>` buffers matching the image
//! layout, true where the source pixel counts as opaque.

use image::RgbaImage;
use rand::Rng;

/// Alpha level a pixel must exceed to count as part of the sprite.
pub const OPAQUE_ALPHA: u8 = 128;

/// Marks pixels whose alpha exceeds `alpha_floor`.
pub fn opaque_mask(img: &RgbaImage, alpha_floor: u8) -> Vec<bool> {
    img.pixels().map(|p| p.0[3] > alpha_floor).collect()
}

/// Grows the mask by one 4-connected ring per iteration.
pub fn dilate(mask: &[bool], width: usize, height: usize, iterations: u32) -> Vec<bool> {
    let mut current = mask.to_vec();
    for _ in 0..iterations {
        let mut next = current.clone();
        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if current[idx] {
                    continue;
                }
                let touches = (x > 0 && current[idx - 1])
                    || (x + 1 < width && current[idx + 1])
                    || (y > 0 && current[idx - width])
                    || (y + 1 < height && current[idx + width]);
                if touches {
                    next[idx] = true;
                }
            }
        }
        current = next;
    }
    current
}

/// Exact Euclidean distance from every pixel to the nearest masked pixel,
/// in pixel units. Masked pixels report zero; a mask with no set pixels
/// reports a huge sentinel distance everywhere.
pub fn distance_to_opaque(mask: &[bool], width: usize, height: usize) -> Vec<f64> {
    // Large finite value so the envelope intersections stay well defined.
    const FAR: f64 = 1e20;

    let mut sq = vec![FAR; width * height];
    for (i, &opaque) in mask.iter().enumerate() {
        if opaque {
            sq[i] = 0.0;
        }
    }

    let line = width.max(height);
    let mut f = vec![0.0f64; line];
    let mut d = vec![0.0f64; line];
    let mut v = vec![0usize; line];
    let mut z = vec![0.0f64; line + 1];

    // Two 1D squared-distance passes, columns then rows.
    for x in 0..width {
        for y in 0..height {
            f[y] = sq[y * width + x];
        }
        squared_distance_1d(&f[..height], &mut d, &mut v, &mut z);
        for y in 0..height {
            sq[y * width + x] = d[y];
        }
    }
    for y in 0..height {
        f[..width].copy_from_slice(&sq[y * width..y * width + width]);
        squared_distance_1d(&f[..width], &mut d, &mut v, &mut z);
        sq[y * width..y * width + width].copy_from_slice(&d[..width]);
    }

    sq.into_iter().map(f64::sqrt).collect()
}

/// Lower-envelope 1D distance transform over squared distances.
fn squared_distance_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }
    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        let mut s = envelope_crossing(f, q, v[k]);
        while s <= z[k] {
            k -= 1;
            s = envelope_crossing(f, q, v[k]);
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }
    k = 0;
    for q in 0..n {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dq = q as f64 - v[k] as f64;
        d[q] = dq * dq + f[v[k]];
    }
}

fn envelope_crossing(f: &[f64], q: usize, p: usize) -> f64 {
    let qf = q as f64;
    let pf = p as f64;
    ((f[q] + qf * qf) - (f[p] + pf * pf)) / (2.0 * qf - 2.0 * pf)
}

/// Zeroes alpha outside the mask.
pub fn apply_silhouette(img: &mut RgbaImage, keep: &[bool]) {
    for (i, pixel) in img.pixels_mut().enumerate() {
        if !keep[i] {
            pixel.0[3] = 0;
        }
    }
}

/// Fades the image out over `extend` pixels past the silhouette.
///
/// Survival probability falls linearly with distance from the silhouette
/// and hits zero at `extend`, with a per-pixel roll so the clipped edge
/// comes out ragged instead of hard. Pixels at distance zero always
/// survive.
pub fn apply_irregular_edge(
    img: &mut RgbaImage,
    distances: &[f64],
    extend: f64,
    rng: &mut impl Rng,
) {
    for (i, pixel) in img.pixels_mut().enumerate() {
        let dist = distances[i];
        let probability = (1.0 - dist / extend).clamp(0.0, 1.0);
        let roll: f64 = rng.gen();
        if !(dist <= extend && roll < probability) {
            pixel.0[3] = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn single_point_mask(width: usize, height: usize, x: usize, y: usize) -> Vec<bool> {
        let mut mask = vec![false; width * height];
        mask[y * width + x] = true;
        mask
    }

    #[test]
    fn dilation_grows_a_cross() {
        let mask = single_point_mask(5, 5, 2, 2);
        let grown = dilate(&mask, 5, 5, 1);
        assert_eq!(grown.iter().filter(|&&b| b).count(), 5);
        assert!(grown[2 * 5 + 1] && grown[2 * 5 + 3]);
        assert!(grown[5 + 2] && grown[3 * 5 + 2]);
        assert!(!grown[0], "diagonal neighbor should stay clear");
    }

    #[test]
    fn zero_iterations_leave_the_mask_unchanged() {
        let mask = single_point_mask(4, 4, 1, 1);
        assert_eq!(dilate(&mask, 4, 4, 0), mask);
    }

    #[test]
    fn repeated_dilation_respects_borders() {
        let mask = single_point_mask(3, 3, 0, 0);
        let grown = dilate(&mask, 3, 3, 4);
        assert!(grown.iter().all(|&b| b), "4 rounds flood a 3x3 grid");
    }

    #[test]
    fn distances_are_zero_on_the_mask() {
        let mask = single_point_mask(7, 5, 3, 2);
        let dist = distance_to_opaque(&mask, 7, 5);
        assert_eq!(dist[2 * 7 + 3], 0.0);
    }

    #[test]
    fn distances_are_euclidean() {
        let mask = single_point_mask(6, 5, 0, 0);
        let dist = distance_to_opaque(&mask, 6, 5);
        assert!((dist[4] - 4.0).abs() < 1e-9);
        assert!((dist[2 * 6] - 2.0).abs() < 1e-9);
        assert!((dist[3 * 6 + 2] - (13.0f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn nearest_of_two_seeds_wins() {
        let mut mask = vec![false; 10];
        mask[0] = true;
        mask[9] = true;
        let dist = distance_to_opaque(&mask, 10, 1);
        assert!((dist[3] - 3.0).abs() < 1e-9);
        assert!((dist[7] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_mask_reports_huge_distances() {
        let dist = distance_to_opaque(&vec![false; 12], 4, 3);
        assert!(dist.iter().all(|&d| d > 1e9));
    }

    #[test]
    fn silhouette_zeroes_alpha_outside_the_mask() {
        let mut img = RgbaImage::from_pixel(4, 1, image::Rgba([10, 20, 30, 255]));
        apply_silhouette(&mut img, &[true, false, true, false]);
        assert_eq!(img.get_pixel(0, 0).0[3], 255);
        assert_eq!(img.get_pixel(1, 0).0[3], 0);
        assert_eq!(img.get_pixel(2, 0).0[3], 255);
        assert_eq!(img.get_pixel(3, 0).0[3], 0);
    }

    #[test]
    fn irregular_edge_keeps_the_core_and_clips_far_pixels() {
        let mut img = RgbaImage::from_pixel(6, 1, image::Rgba([10, 20, 30, 255]));
        let distances = [0.0, 0.0, 0.0, 50.0, 60.0, 70.0];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        apply_irregular_edge(&mut img, &distances, 4.0, &mut rng);
        for x in 0..3 {
            assert_eq!(img.get_pixel(x, 0).0[3], 255, "core pixel {x} clipped");
        }
        for x in 3..6 {
            assert_eq!(img.get_pixel(x, 0).0[3], 0, "far pixel {x} survived");
        }
    }
}

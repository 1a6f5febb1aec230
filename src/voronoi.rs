//! Voronoi mosaic synthesis.
//!
//! Sites are sampled from the sprite's opaque pixels, the diagram is
//! built from the Delaunay dual, unbounded cells are closed off with far
//! points, and each cell is painted with the dominant color nearest the
//! pixel under its site. The result is clipped back toward the sprite
//! with a raggedy probabilistic edge.

use delaunator::{triangulate, Point, EMPTY};
use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::cluster::{self, Cluster};
use crate::draw;
use crate::error::MosaicError;
use crate::mask;

/// Settings for the Voronoi mosaic.
#[derive(Debug, Clone)]
pub struct VoronoiOptions {
    /// Number of cell sites sampled from the sprite.
    pub sites: usize,
    /// How far, in pixels, cells may bleed past the silhouette before the
    /// probabilistic edge clips them. Zero disables clipping entirely.
    pub extend: f64,
}

impl Default for VoronoiOptions {
    fn default() -> Self {
        VoronoiOptions {
            sites: 50,
            extend: 20.0,
        }
    }
}

impl VoronoiOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sites(mut self, sites: usize) -> Self {
        self.sites = sites;
        self
    }

    pub fn extend(mut self, extend: f64) -> Self {
        self.extend = extend;
        self
    }
}

/// Renders the Voronoi mosaic at the sprite's native resolution.
pub fn render_voronoi(
    img: &RgbaImage,
    palette: &[Cluster],
    opts: &VoronoiOptions,
    rng: &mut impl Rng,
) -> Result<RgbaImage, MosaicError> {
    if opts.sites == 0 {
        return Err(MosaicError::InvalidSiteCount(opts.sites));
    }
    if palette.is_empty() {
        return Err(MosaicError::InvalidClusterCount(0));
    }
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(MosaicError::ZeroCanvas);
    }

    let sites = sample_sites(img, opts.sites, rng);
    let mut all_points = sites.clone();
    all_points.extend_from_slice(&frame_points(width as f64, height as f64));
    let (regions, vertices) = finite_regions(&all_points)?;

    let mut mosaic = RgbaImage::new(width, height);
    // Frame-point regions exist only to bound the diagram.
    for (idx, region) in regions.iter().enumerate().take(sites.len()) {
        let site_x = (sites[idx].0 as i64).clamp(0, width as i64 - 1) as u32;
        let site_y = (sites[idx].1 as i64).clamp(0, height as i64 - 1) as u32;
        let under = img.get_pixel(site_x, site_y);
        if under.0[3] < mask::OPAQUE_ALPHA {
            continue;
        }
        let target = [under.0[0] as f64, under.0[1] as f64, under.0[2] as f64];
        let Some(color) = cluster::nearest_rgb(palette, target) else {
            continue;
        };
        let polygon: Vec<(f64, f64)> = region.iter().map(|&v| vertices[v]).collect();
        draw::fill_polygon(
            &mut mosaic,
            &polygon,
            Rgba([color[0], color[1], color[2], 255]),
        );
    }

    if opts.extend > 0.0 {
        let alpha = mask::opaque_mask(img, mask::OPAQUE_ALPHA);
        let distances = mask::distance_to_opaque(&alpha, width as usize, height as usize);
        mask::apply_irregular_edge(&mut mosaic, &distances, opts.extend, rng);
    }
    Ok(mosaic)
}

/// Samples up to `n` distinct sites from the sprite's opaque pixels.
/// A sprite with no opaque pixels falls back to uniform random points.
fn sample_sites(img: &RgbaImage, n: usize, rng: &mut impl Rng) -> Vec<(f64, f64)> {
    let (width, height) = img.dimensions();
    let mut coords: Vec<(u32, u32)> = Vec::new();
    for (x, y, p) in img.enumerate_pixels() {
        if p.0[3] > mask::OPAQUE_ALPHA {
            coords.push((x, y));
        }
    }
    if coords.is_empty() {
        return (0..n)
            .map(|_| {
                (
                    rng.gen::<f64>() * width as f64,
                    rng.gen::<f64>() * height as f64,
                )
            })
            .collect();
    }
    let take = n.min(coords.len());
    rand::seq::index::sample(rng, coords.len(), take)
        .into_iter()
        .map(|i| (coords[i].0 as f64, coords[i].1 as f64))
        .collect()
}

/// Fixed frame of helper points that keeps every real cell bounded near
/// the canvas: the four corners plus the four edge midpoints.
fn frame_points(width: f64, height: f64) -> [(f64, f64); 8] {
    [
        (0.0, 0.0),
        (width, 0.0),
        (width, height),
        (0.0, height),
        (width / 2.0, 0.0),
        (width, height / 2.0),
        (width / 2.0, height),
        (0.0, height / 2.0),
    ]
}

/// Builds one closed polygon per input point from the Delaunay dual.
///
/// Voronoi vertices are triangle circumcenters. Cells of interior points
/// are exactly their incident circumcenters; cells of hull points are
/// unbounded, so each of their two open ridges is capped with a far point
/// pushed out along the ridge direction. Every cell is returned in
/// angular order around its own centroid, which is valid because Voronoi
/// cells are convex. Points that end up in no triangle get empty cells.
fn finite_regions(
    points: &[(f64, f64)],
) -> Result<(Vec<Vec<usize>>, Vec<(f64, f64)>), MosaicError> {
    let input: Vec<Point> = points.iter().map(|&(x, y)| Point { x, y }).collect();
    let triangulation = triangulate(&input);
    if triangulation.triangles.is_empty() {
        return Err(MosaicError::DegenerateGeometry {
            points: points.len(),
        });
    }

    let triangle_count = triangulation.triangles.len() / 3;
    let mut vertices: Vec<(f64, f64)> = Vec::with_capacity(triangle_count);
    for t in 0..triangle_count {
        let a = &input[triangulation.triangles[3 * t]];
        let b = &input[triangulation.triangles[3 * t + 1]];
        let c = &input[triangulation.triangles[3 * t + 2]];
        vertices.push(circumcenter(a, b, c));
    }

    let mut incident: Vec<Vec<usize>> = vec![Vec::new(); points.len()];
    for (e, &site) in triangulation.triangles.iter().enumerate() {
        incident[site].push(e / 3);
    }

    // Hull edges have no twin; their dual ridges run open-ended from the
    // circumcenter of the one adjacent triangle.
    let mut open_ridges: Vec<Vec<(usize, usize)>> = vec![Vec::new(); points.len()];
    for e in 0..triangulation.triangles.len() {
        if triangulation.halfedges[e] == EMPTY {
            let from = triangulation.triangles[e];
            let to = triangulation.triangles[next_halfedge(e)];
            open_ridges[from].push((to, e / 3));
            open_ridges[to].push((from, e / 3));
        }
    }

    let center = mean_point(points);
    let radius = 2.0 * max_spread(points);

    let mut regions: Vec<Vec<usize>> = Vec::with_capacity(points.len());
    for site in 0..points.len() {
        let mut region = incident[site].clone();
        for &(other, finite_vertex) in &open_ridges[site] {
            let dx = points[other].0 - points[site].0;
            let dy = points[other].1 - points[site].1;
            let len = (dx * dx + dy * dy).sqrt();
            if len == 0.0 {
                continue;
            }
            // Outward normal of the ridge, oriented away from the cloud center.
            let (nx, ny) = (-dy / len, dx / len);
            let mid_x = (points[site].0 + points[other].0) / 2.0;
            let mid_y = (points[site].1 + points[other].1) / 2.0;
            let side = sign((mid_x - center.0) * nx + (mid_y - center.1) * ny);
            let far = (
                vertices[finite_vertex].0 + side * nx * radius,
                vertices[finite_vertex].1 + side * ny * radius,
            );
            region.push(vertices.len());
            vertices.push(far);
        }
        sort_by_angle(&mut region, &vertices);
        regions.push(region);
    }
    Ok((regions, vertices))
}

fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 {
        e - 2
    } else {
        e + 1
    }
}

fn circumcenter(a: &Point, b: &Point, c: &Point) -> (f64, f64) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let ex = c.x - a.x;
    let ey = c.y - a.y;
    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    // Twice the signed triangle area, nonzero for triangulation output.
    let d = 2.0 * (dx * ey - dy * ex);
    (
        a.x + (ey * bl - dy * cl) / d,
        a.y + (dx * cl - ex * bl) / d,
    )
}

fn mean_point(points: &[(f64, f64)]) -> (f64, f64) {
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold((0.0, 0.0), |acc, p| (acc.0 + p.0, acc.1 + p.1));
    (sum.0 / n, sum.1 / n)
}

/// Largest per-axis extent of the point cloud.
fn max_spread(points: &[(f64, f64)]) -> f64 {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min.0 = min.0.min(p.0);
        min.1 = min.1.min(p.1);
        max.0 = max.0.max(p.0);
        max.1 = max.1.max(p.1);
    }
    (max.0 - min.0).max(max.1 - min.1)
}

fn sign(v: f64) -> f64 {
    if v > 0.0 {
        1.0
    } else if v < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn sort_by_angle(region: &mut [usize], vertices: &[(f64, f64)]) {
    if region.is_empty() {
        return;
    }
    let n = region.len() as f64;
    let (mut cx, mut cy) = (0.0, 0.0);
    for &v in region.iter() {
        cx += vertices[v].0;
        cy += vertices[v].1;
    }
    cx /= n;
    cy /= n;
    region.sort_by(|&a, &b| {
        let angle_a = (vertices[a].1 - cy).atan2(vertices[a].0 - cx);
        let angle_b = (vertices[b].1 - cy).atan2(vertices[b].0 - cx);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn solid_sprite(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn approx(a: (f64, f64), b: (f64, f64)) -> bool {
        (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
    }

    fn contains(polygon: &[(f64, f64)], p: (f64, f64)) -> bool {
        let mut inside = false;
        for i in 0..polygon.len() {
            let (x1, y1) = polygon[i];
            let (x2, y2) = polygon[(i + 1) % polygon.len()];
            if (y1 > p.1) != (y2 > p.1) && p.0 < x1 + (p.1 - y1) * (x2 - x1) / (y2 - y1) {
                inside = !inside;
            }
        }
        inside
    }

    #[test]
    fn circumcenter_of_a_right_triangle() {
        let a = Point { x: 0.0, y: 0.0 };
        let b = Point { x: 4.0, y: 0.0 };
        let c = Point { x: 2.0, y: 2.0 };
        assert!(approx(circumcenter(&a, &b, &c), (2.0, 0.0)));
    }

    #[test]
    fn interior_point_gets_the_inscribed_diamond() {
        let points = [
            (2.0, 2.0),
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ];
        let (regions, vertices) = finite_regions(&points).unwrap();
        assert_eq!(regions.len(), 5);

        let diamond = &regions[0];
        assert_eq!(diamond.len(), 4, "center cell should have four vertices");
        for expected in [(2.0, 0.0), (4.0, 2.0), (2.0, 4.0), (0.0, 2.0)] {
            assert!(
                diamond.iter().any(|&v| approx(vertices[v], expected)),
                "missing vertex {expected:?}"
            );
        }
    }

    #[test]
    fn hull_points_get_closed_cells() {
        let points = [
            (2.0, 2.0),
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ];
        let (regions, _) = finite_regions(&points).unwrap();
        for region in &regions[1..] {
            assert!(region.len() >= 3, "hull cell degenerate: {region:?}");
        }
    }

    #[test]
    fn every_site_lies_inside_its_own_cell() {
        let points = [
            (2.0, 2.0),
            (0.0, 0.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ];
        let (regions, vertices) = finite_regions(&points).unwrap();
        for (site, region) in points.iter().zip(&regions) {
            let polygon: Vec<(f64, f64)> = region.iter().map(|&v| vertices[v]).collect();
            assert!(contains(&polygon, *site), "site {site:?} outside its cell");
        }
    }

    #[test]
    fn collinear_points_are_degenerate() {
        let points = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)];
        assert!(matches!(
            finite_regions(&points),
            Err(MosaicError::DegenerateGeometry { points: 3 })
        ));
    }

    #[test]
    fn sites_come_from_opaque_pixels_only() {
        let mut img = RgbaImage::new(10, 10);
        for y in 0..10 {
            for x in 0..5 {
                img.put_pixel(x, y, Rgba([50, 50, 50, 255]));
            }
        }
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sites = sample_sites(&img, 50, &mut rng);
        assert_eq!(sites.len(), 50);
        assert!(sites.iter().all(|s| s.0 < 5.0));
    }

    #[test]
    fn site_sampling_is_without_replacement() {
        let img = solid_sprite(4, 4, [50, 50, 50]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut sites = sample_sites(&img, 16, &mut rng);
        sites.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sites.dedup();
        assert_eq!(sites.len(), 16, "expected all 16 pixels exactly once");
    }

    #[test]
    fn transparent_sprite_falls_back_to_uniform_sites() {
        let img = RgbaImage::new(12, 6);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sites = sample_sites(&img, 7, &mut rng);
        assert_eq!(sites.len(), 7);
        assert!(sites.iter().all(|s| s.0 >= 0.0 && s.0 < 12.0));
        assert!(sites.iter().all(|s| s.1 >= 0.0 && s.1 < 6.0));
    }

    #[test]
    fn solid_sprite_is_mostly_covered_in_palette_color() {
        let img = solid_sprite(32, 32, [90, 140, 60]);
        let palette = [Cluster::new([90, 140, 60], 1024)];
        let opts = VoronoiOptions::new().extend(0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mosaic = render_voronoi(&img, &palette, &opts, &mut rng).unwrap();
        let painted = mosaic.pixels().filter(|p| p.0[3] != 0).count();
        assert!(painted > 512, "painted only {painted} of 1024 pixels");
        assert!(mosaic
            .pixels()
            .filter(|p| p.0[3] != 0)
            .all(|p| p.0 == [90, 140, 60, 255]));
    }

    #[test]
    fn opaque_pixels_survive_the_irregular_edge() {
        let img = solid_sprite(32, 32, [90, 140, 60]);
        let palette = [Cluster::new([90, 140, 60], 1024)];
        let mut rng_a = ChaCha8Rng::seed_from_u64(5);
        let mut rng_b = ChaCha8Rng::seed_from_u64(5);
        let clipped = render_voronoi(
            &img,
            &palette,
            &VoronoiOptions::new().extend(20.0),
            &mut rng_a,
        )
        .unwrap();
        let unclipped = render_voronoi(
            &img,
            &palette,
            &VoronoiOptions::new().extend(0.0),
            &mut rng_b,
        )
        .unwrap();
        assert_eq!(clipped.as_raw(), unclipped.as_raw());
    }

    #[test]
    fn far_columns_are_clipped() {
        let mut img = RgbaImage::new(32, 32);
        for y in 0..32 {
            for x in 0..16 {
                img.put_pixel(x, y, Rgba([50, 90, 200, 255]));
            }
        }
        let palette = [Cluster::new([50, 90, 200], 512)];
        let opts = VoronoiOptions::new().extend(4.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mosaic = render_voronoi(&img, &palette, &opts, &mut rng).unwrap();
        for y in 0..32 {
            for x in 24..32 {
                assert_eq!(mosaic.get_pixel(x, y).0[3], 0, "pixel ({x}, {y}) kept");
            }
        }
    }

    #[test]
    fn transparent_sprite_renders_empty() {
        let img = RgbaImage::new(16, 16);
        let palette = [Cluster::new([255, 255, 255], 0)];
        let opts = VoronoiOptions::new().extend(0.0);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mosaic = render_voronoi(&img, &palette, &opts, &mut rng).unwrap();
        assert!(mosaic.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn zero_sites_are_rejected() {
        let img = solid_sprite(8, 8, [1, 2, 3]);
        let palette = [Cluster::new([1, 2, 3], 64)];
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let opts = VoronoiOptions::new().sites(0);
        assert!(matches!(
            render_voronoi(&img, &palette, &opts, &mut rng),
            Err(MosaicError::InvalidSiteCount(0))
        ));
    }
}

//! Polygon rasterization for mosaic cells.

use image::{Rgba, RgbaImage};

/// Fills a polygon using even-odd scanline coverage.
///
/// A pixel is painted when its center lies inside the polygon, so
/// adjacent cells sharing an edge tile without gaps or double-painted
/// seams. Spans are clamped to the canvas and polygons with fewer than
/// three vertices paint nothing.
pub fn fill_polygon(img: &mut RgbaImage, vertices: &[(f64, f64)], color: Rgba<u8>) {
    if vertices.len() < 3 {
        return;
    }
    let (width, height) = img.dimensions();

    let min_y = vertices
        .iter()
        .map(|v| v.1)
        .fold(f64::INFINITY, f64::min);
    let max_y = vertices
        .iter()
        .map(|v| v.1)
        .fold(f64::NEG_INFINITY, f64::max);
    let row_start = min_y.floor().max(0.0) as u32;
    let row_end = (max_y.ceil() as i64).min(height as i64 - 1);
    if row_end < 0 {
        return;
    }

    let mut crossings: Vec<f64> = Vec::new();
    for row in row_start..=row_end as u32 {
        let sample_y = row as f64 + 0.5;
        crossings.clear();
        for i in 0..vertices.len() {
            let (x1, y1) = vertices[i];
            let (x2, y2) = vertices[(i + 1) % vertices.len()];
            if y1 == y2 {
                continue;
            }
            // Half-open interval so a crossing at a shared vertex counts once.
            let crosses = (y1 <= sample_y && sample_y < y2) || (y2 <= sample_y && sample_y < y1);
            if crosses {
                crossings.push(x1 + (sample_y - y1) * (x2 - x1) / (y2 - y1));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        for pair in crossings.chunks_exact(2) {
            let span_start = (pair[0] - 0.5).ceil().max(0.0) as i64;
            let span_end = ((pair[1] - 0.5).floor() as i64).min(width as i64 - 1);
            for x in span_start..=span_end {
                img.put_pixel(x as u32, row, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([200, 0, 0, 255]);

    fn painted(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] != 0).count()
    }

    #[test]
    fn axis_aligned_square_fills_exactly() {
        let mut img = RgbaImage::new(8, 8);
        let square = [(1.0, 1.0), (5.0, 1.0), (5.0, 5.0), (1.0, 5.0)];
        fill_polygon(&mut img, &square, RED);
        // Pixel centers inside [1, 5] x [1, 5] are columns and rows 1..=4.
        assert_eq!(painted(&img), 16);
        assert_eq!(img.get_pixel(1, 1).0, RED.0);
        assert_eq!(img.get_pixel(4, 4).0, RED.0);
        assert_eq!(img.get_pixel(5, 5).0[3], 0);
        assert_eq!(img.get_pixel(0, 3).0[3], 0);
    }

    #[test]
    fn triangle_interior_is_filled() {
        let mut img = RgbaImage::new(16, 16);
        let triangle = [(2.0, 2.0), (14.0, 2.0), (8.0, 14.0)];
        fill_polygon(&mut img, &triangle, RED);
        assert_eq!(img.get_pixel(8, 5).0, RED.0);
        assert_eq!(img.get_pixel(0, 0).0[3], 0);
        assert_eq!(img.get_pixel(15, 15).0[3], 0);
        assert!(painted(&img) > 0);
    }

    #[test]
    fn degenerate_polygons_paint_nothing() {
        let mut img = RgbaImage::new(8, 8);
        fill_polygon(&mut img, &[], RED);
        fill_polygon(&mut img, &[(1.0, 1.0), (5.0, 5.0)], RED);
        assert_eq!(painted(&img), 0);
    }

    #[test]
    fn spans_are_clamped_to_the_canvas() {
        let mut img = RgbaImage::new(4, 4);
        let oversized = [(-10.0, -10.0), (10.0, -10.0), (10.0, 10.0), (-10.0, 10.0)];
        fill_polygon(&mut img, &oversized, RED);
        assert_eq!(painted(&img), 16);
    }

    #[test]
    fn polygon_above_the_canvas_paints_nothing() {
        let mut img = RgbaImage::new(4, 4);
        let above = [(0.0, -9.0), (4.0, -9.0), (2.0, -2.0)];
        fill_polygon(&mut img, &above, RED);
        assert_eq!(painted(&img), 0);
    }

    #[test]
    fn adjacent_cells_tile_without_seams() {
        let mut img = RgbaImage::new(8, 8);
        let left = [(0.0, 0.0), (4.0, 0.0), (4.0, 8.0), (0.0, 8.0)];
        let right = [(4.0, 0.0), (8.0, 0.0), (8.0, 8.0), (4.0, 8.0)];
        fill_polygon(&mut img, &left, RED);
        fill_polygon(&mut img, &right, Rgba([0, 0, 200, 255]));
        assert_eq!(painted(&img), 64);
        assert_eq!(img.get_pixel(3, 4).0, RED.0);
        assert_eq!(img.get_pixel(4, 4).0, [0, 0, 200, 255]);
    }
}

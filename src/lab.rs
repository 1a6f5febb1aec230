use palette::{FromColor, LinSrgb, Srgb};

/// CIE L*a*b* color representation (D65 white point).
///
/// L: lightness [0, 100], a: green-red axis, b: blue-yellow axis.
/// Distances in this space approximate perceived color difference,
/// which is what the merge and deduplication thresholds are tuned in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl Lab {
    pub const fn new(l: f32, a: f32, b: f32) -> Self {
        Self { l, a, b }
    }

    /// Convert an sRGB triple (0..255 per channel) to Lab.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let srgb: Srgb<f32> = Srgb::new(
            rgb[0] as f32 / 255.0,
            rgb[1] as f32 / 255.0,
            rgb[2] as f32 / 255.0,
        );
        let lin: LinSrgb<f32> = srgb.into_linear();
        let lab = palette::Lab::from_color(lin);
        Self {
            l: lab.l,
            a: lab.a,
            b: lab.b,
        }
    }

    /// Euclidean distance in Lab space (delta E 76).
    pub fn distance(self, other: Self) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Squared Euclidean distance. Cheaper when only ordering matters.
    pub fn distance_sq(self, other: Self) -> f32 {
        let dl = self.l - other.l;
        let da = self.a - other.a;
        let db = self.b - other.b;
        dl * dl + da * da + db * db
    }
}

/// Whether two sRGB colors fall within `threshold` Lab units of each other.
///
/// Strict comparison: a distance exactly equal to the threshold is not similar.
pub fn is_similar(a: [u8; 3], b: [u8; 3], threshold: f32) -> bool {
    Lab::from_rgb(a).distance(Lab::from_rgb(b)) < threshold
}

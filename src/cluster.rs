use crate::lab::Lab;

/// A dominant-color cluster: representative color plus pixel population.
///
/// Weight is a pixel count. It is only zero in the degenerate-input fallback
/// palette (all-white, produced when an image has no eligible pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    pub rgb: [u8; 3],
    pub weight: u64,
}

impl Cluster {
    pub const fn new(rgb: [u8; 3], weight: u64) -> Self {
        Self { rgb, weight }
    }
}

/// Sort clusters by descending weight. Stable, so equal weights keep their
/// relative order.
pub fn sort_by_weight(clusters: &mut [Cluster]) {
    clusters.sort_by(|a, b| b.weight.cmp(&a.weight));
}

/// Total pixel population of a palette.
pub fn total_weight(clusters: &[Cluster]) -> u64 {
    clusters.iter().map(|c| c.weight).sum()
}

/// Nearest palette color to `target` by squared RGB distance, or None for
/// an empty palette. The earliest of equally close entries wins, so rank
/// order stays decisive for ties.
pub fn nearest_rgb(palette: &[Cluster], target: [f64; 3]) -> Option<[u8; 3]> {
    let mut best: Option<[u8; 3]> = None;
    let mut best_dist = f64::INFINITY;
    for cluster in palette {
        let mut dist = 0.0f64;
        for ch in 0..3 {
            let diff = cluster.rgb[ch] as f64 - target[ch];
            dist += diff * diff;
        }
        if dist < best_dist {
            best_dist = dist;
            best = Some(cluster.rgb);
        }
    }
    best
}

/// Weighted per-channel average of two clusters' colors.
///
/// Truncating integer division, so repeated merges stay in u8 space without
/// accumulating float state. Two zero-weight clusters average to the
/// survivor's color.
fn weighted_average(a: Cluster, b: Cluster) -> [u8; 3] {
    let total = a.weight + b.weight;
    if total == 0 {
        return a.rgb;
    }
    let mut rgb = [0u8; 3];
    for ch in 0..3 {
        let sum = a.rgb[ch] as u64 * a.weight + b.rgb[ch] as u64 * b.weight;
        rgb[ch] = (sum / total) as u8;
    }
    rgb
}

/// Greedy threshold merge: fold each cluster into the first already-accepted
/// cluster within `threshold` Lab units, in descending-weight order.
///
/// This is order-dependent by contract. Heavier clusters are accepted first
/// and act as merge anchors; a lighter cluster joins the first anchor it is
/// similar to, not the nearest one. The survivor's color becomes the weighted
/// average and its Lab point is recomputed, so later candidates compare
/// against the drifted anchor. Output is re-sorted by descending weight.
pub fn merge_similar(clusters: &[Cluster], threshold: f32) -> Vec<Cluster> {
    let mut input = clusters.to_vec();
    sort_by_weight(&mut input);

    let mut merged: Vec<(Cluster, Lab)> = Vec::new();
    for c in input {
        let lab = Lab::from_rgb(c.rgb);
        let mut placed = false;
        for anchor in merged.iter_mut() {
            if lab.distance(anchor.1) < threshold {
                let rgb = weighted_average(anchor.0, c);
                anchor.0 = Cluster::new(rgb, anchor.0.weight + c.weight);
                anchor.1 = Lab::from_rgb(rgb);
                placed = true;
                break;
            }
        }
        if !placed {
            merged.push((c, lab));
        }
    }

    let mut out: Vec<Cluster> = merged.into_iter().map(|(c, _)| c).collect();
    sort_by_weight(&mut out);
    out
}

/// Agglomeratively merge the closest pair of clusters until `n` remain.
///
/// Exhaustive O(n²) closest-pair scan per step, ties broken by first found.
/// The merged cluster is appended at the end and participates in later
/// steps. `n == 0` means no reduction requested; inputs already at or below
/// `n` pass through unchanged. Total weight is conserved exactly.
pub fn reduce_to_n(clusters: &[Cluster], n: usize) -> Vec<Cluster> {
    if n == 0 || clusters.len() <= n {
        return clusters.to_vec();
    }

    let mut items: Vec<(Cluster, Lab)> = clusters
        .iter()
        .map(|&c| (c, Lab::from_rgb(c.rgb)))
        .collect();

    while items.len() > n {
        let mut best = (0usize, 1usize);
        let mut best_d = f32::INFINITY;
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let d = items[i].1.distance_sq(items[j].1);
                if d < best_d {
                    best_d = d;
                    best = (i, j);
                }
            }
        }

        let (i, j) = best;
        // Higher index first so the lower one stays valid.
        let b = items.remove(j);
        let a = items.remove(i);
        let rgb = weighted_average(a.0, b.0);
        items.push((Cluster::new(rgb, a.0.weight + b.0.weight), Lab::from_rgb(rgb)));
    }

    let mut out: Vec<Cluster> = items.into_iter().map(|(c, _)| c).collect();
    sort_by_weight(&mut out);
    out
}

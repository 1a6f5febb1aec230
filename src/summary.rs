//! Name selection and the `colours.csv` summary report.
//!
//! Each processed image contributes one row: an id, an optional display
//! name, and up to three family names chosen from the top-ranked clusters
//! under the selection rules below.

use std::collections::HashSet;
use std::path::Path;

use serde::Serialize;

use crate::cluster::Cluster;
use crate::error::MosaicError;
use crate::lab::is_similar;
use crate::namer;

/// How many ranked clusters the selection rules consider.
const CANDIDATE_WINDOW: usize = 5;
/// Maximum number of names reported per row.
const MAX_NAMES: usize = 3;

/// One row of the summary report. Unfilled name slots serialize as empty
/// strings so every row carries the same five columns.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRow {
    pub id: String,
    pub name: String,
    pub color1: String,
    pub color2: String,
    pub color3: String,
}

impl SummaryRow {
    pub fn new(id: impl Into<String>, name: impl Into<String>, colors: &[&str]) -> Self {
        SummaryRow {
            id: id.into(),
            name: name.into(),
            color1: colors.first().copied().unwrap_or("").to_string(),
            color2: colors.get(1).copied().unwrap_or("").to_string(),
            color3: colors.get(2).copied().unwrap_or("").to_string(),
        }
    }
}

/// Picks up to three family names from ranked clusters.
///
/// Candidates are taken in weight order from the first five clusters. A
/// candidate within `dedupe_threshold` Lab distance of an already accepted
/// color is skipped before any name rule runs. The dominant cluster is
/// always accepted; black is only accepted directly behind the dominant
/// color; grey is only ever reported from the dominant slot; every other
/// name is accepted once.
pub fn select_names(clusters: &[Cluster], dedupe_threshold: f32) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = Vec::new();
    let mut accepted: Vec<[u8; 3]> = Vec::new();
    let mut seen: HashSet<&'static str> = HashSet::new();

    for (idx, cluster) in clusters.iter().take(CANDIDATE_WINDOW).enumerate() {
        let name = namer::name_of(cluster.rgb);
        if accepted
            .iter()
            .any(|&prev| is_similar(cluster.rgb, prev, dedupe_threshold))
        {
            continue;
        }
        let accept = if idx == 0 {
            true
        } else {
            match name {
                "black" => idx < 2 && !seen.contains(name),
                "grey" => idx == 0 && !seen.contains(name),
                _ => !seen.contains(name),
            }
        };
        if accept {
            names.push(name);
            accepted.push(cluster.rgb);
            seen.insert(name);
        }
        if names.len() == MAX_NAMES {
            break;
        }
    }
    names
}

/// Writes rows as `colours.csv`, sorted so numeric ids come first in
/// ascending order and everything else follows lexicographically.
///
/// The header is written even for an empty batch.
pub fn write_csv(path: &Path, rows: &[SummaryRow]) -> Result<(), MosaicError> {
    let mut sorted: Vec<SummaryRow> = rows.to_vec();
    sorted.sort_by_cached_key(|row| sort_key(&row.id));

    let mut writer = csv::WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(["id", "name", "color1", "color2", "color3"])?;
    for row in &sorted {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn sort_key(id: &str) -> (u8, u64, String) {
    match id.parse::<u64>() {
        Ok(n) => (0, n, String::new()),
        Err(_) => (1, 0, id.to_string()),
    }
}

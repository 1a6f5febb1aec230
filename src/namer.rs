//! Human-readable names for cluster colors.
//!
//! Naming is two-tiered: an exact lookup against the CSS3 extended color
//! keywords, then a nearest-swatch search over a small base dictionary.
//! The base dictionary is what the summary rules reason about, so a color
//! that misses the CSS3 table always lands on one of its eleven names.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Base dictionary of family names and representative swatches.
///
/// Iteration order is part of the contract: when two swatches are equally
/// close, the later one wins, so families listed further down shadow
/// earlier ones at the boundary.
const BASE_COLORS: &[(&str, &[[u8; 3]])] = &[
    ("red", &[
        [0xff, 0x00, 0x00],
        [0xe3, 0x26, 0x36],
        [0xc4, 0x1e, 0x3a],
        [0xb2, 0x22, 0x22],
    ]),
    ("blue", &[
        [0x00, 0x00, 0xff],
        [0x1e, 0x90, 0xff],
        [0x46, 0x82, 0xb4],
        [0x41, 0x69, 0xe1],
    ]),
    ("yellow", &[
        [0xff, 0xff, 0x00],
        [0xff, 0xd7, 0x00],
        [0xff, 0xf7, 0x00],
        [0xf7, 0xe8, 0x53],
        [0xf5, 0xc0, 0x21],
        [0xfb, 0xf4, 0xa7],
    ]),
    ("green", &[
        [0x00, 0x80, 0x00],
        [0x22, 0x8b, 0x22],
        [0x00, 0xff, 0x00],
        [0x32, 0xcd, 0x32],
        [0x35, 0x8b, 0x8a],
    ]),
    ("black", &[
        [0x00, 0x00, 0x00],
        [0x22, 0x22, 0x22],
    ]),
    ("brown", &[
        [0xa5, 0x2a, 0x2a],
        [0x8b, 0x45, 0x13],
        [0xde, 0xb8, 0x87],
        [0xa6, 0x84, 0x5a],
        [0x85, 0x5b, 0x40],
    ]),
    ("purple", &[
        [0x80, 0x00, 0x80],
        [0x8a, 0x2b, 0xe2],
        [0x6a, 0x0d, 0xad],
        [0xb4, 0x6f, 0xba],
    ]),
    ("grey", &[
        [0x80, 0x80, 0x80],
        [0xa9, 0xa9, 0xa9],
        [0xd3, 0xd3, 0xd3],
    ]),
    ("white", &[
        [0xff, 0xff, 0xff],
        [0xf8, 0xf8, 0xff],
        [0xf5, 0xf5, 0xf5],
        [0xea, 0xe8, 0xf7],
    ]),
    ("orange", &[
        [0xff, 0xa5, 0x00],
        [0xff, 0x8c, 0x00],
        [0xff, 0xb3, 0x47],
        [0xf9, 0x97, 0x44],
        [0x88, 0x2a, 0x0c],
    ]),
    ("pink", &[
        [0xff, 0xc0, 0xcb],
        [0xff, 0x69, 0xb4],
        [0xff, 0xb6, 0xc1],
        [0xf7, 0x87, 0x6f],
    ]),
];

static CSS3_EXACT: OnceLock<HashMap<[u8; 3], &'static str>> = OnceLock::new();

/// Exact CSS3 keyword table, parsed once from the embedded data file.
///
/// Entries are listed alphabetically and later inserts overwrite, so the
/// aliased values resolve to the later spelling (`grey` over `gray`,
/// `cyan` over `aqua`, `magenta` over `fuchsia`).
fn css3_exact() -> &'static HashMap<[u8; 3], &'static str> {
    CSS3_EXACT.get_or_init(|| {
        let mut map = HashMap::new();
        for line in include_str!("data/css_colors.txt").lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((name, hex)) = line.split_once(',') else {
                continue;
            };
            if let Some(rgb) = parse_hex(hex) {
                map.insert(rgb, name);
            }
        }
        map
    })
}

fn parse_hex(s: &str) -> Option<[u8; 3]> {
    let s = s.trim().strip_prefix('#')?;
    if s.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&s[0..2], 16).ok()?;
    let g = u8::from_str_radix(&s[2..4], 16).ok()?;
    let b = u8::from_str_radix(&s[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Names a color: exact CSS3 keyword if one matches, otherwise the base
/// family whose swatches come closest in squared RGB distance.
pub fn name_of(rgb: [u8; 3]) -> &'static str {
    if let Some(name) = css3_exact().get(&rgb) {
        return name;
    }
    nearest_base_name(rgb)
}

fn nearest_base_name(rgb: [u8; 3]) -> &'static str {
    let mut best_name = BASE_COLORS[0].0;
    let mut best_dist = u32::MAX;
    for (name, swatches) in BASE_COLORS {
        for swatch in *swatches {
            let dist = distance_sq(rgb, *swatch);
            // Ties go to the later swatch so family order stays decisive.
            if dist <= best_dist {
                best_dist = dist;
                best_name = name;
            }
        }
    }
    best_name
}

fn distance_sq(a: [u8; 3], b: [u8; 3]) -> u32 {
    let dr = a[0] as i32 - b[0] as i32;
    let dg = a[1] as i32 - b[1] as i32;
    let db = a[2] as i32 - b[2] as i32;
    (dr * dr + dg * dg + db * db) as u32
}

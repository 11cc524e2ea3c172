//! Alignment pattern search around a predicted bottom-right position.

use crate::debug::trace;
use crate::detector::finder::PatternHit;
use crate::models::{Bitmap, Point};

/// Window side factors tried in order, in units of the module size.
const WINDOW_FACTORS: [f32; 3] = [4.0, 8.0, 16.0];

/// Search for the light-dark-light alignment cross-section near
/// `estimate`, expanding the window until something passes both the
/// horizontal and vertical run checks.
///
/// Version-1 symbols have no alignment pattern; callers fall back to the
/// parallelogram estimate when this returns `None`.
pub fn find(matrix: &Bitmap, estimate: Point, module_size: f32) -> Option<PatternHit> {
    for factor in WINDOW_FACTORS {
        let half = factor * module_size / 2.0;
        if let Some(hit) = search_window(matrix, estimate, module_size, half) {
            trace!(
                "ALIGN: found at ({:.1}, {:.1}) in window {:.0}",
                hit.x,
                hit.y,
                factor
            );
            return Some(hit);
        }
    }
    None
}

/// Scan window rows outward from the vertical center; the first candidate
/// that also passes the vertical check wins, merged candidates first.
fn search_window(
    matrix: &Bitmap,
    estimate: Point,
    module_size: f32,
    half: f32,
) -> Option<PatternHit> {
    let min_x = ((estimate.x - half).floor().max(0.0)) as usize;
    let max_x = ((estimate.x + half).ceil().min(matrix.width() as f32 - 1.0)) as usize;
    let min_y = ((estimate.y - half).floor().max(0.0)) as usize;
    let max_y = ((estimate.y + half).ceil().min(matrix.height() as f32 - 1.0)) as usize;
    if min_x >= max_x || min_y >= max_y {
        return None;
    }

    let center_y = estimate.y.round().clamp(min_y as f32, max_y as f32) as usize;
    let span = max_y - min_y + 1;
    let mut best: Option<PatternHit> = None;

    for step in 0..span {
        // 0, +1, -1, +2, -2, ... from the center row.
        let offset = (step as isize + 1) / 2 * if step % 2 == 1 { 1 } else { -1 };
        let row = center_y as isize + offset;
        if row < (min_y as isize) || row > (max_y as isize) {
            continue;
        }
        let row = row as usize;

        for (cx, total) in scan_row(matrix, row, min_x, max_x, module_size) {
            let Some((cy, _)) = cross_check_vertical(matrix, cx, row, module_size, half)
            else {
                continue;
            };
            let ms = total / 3.0;
            match best.as_mut() {
                Some(hit) if hit.about_equals(cx, cy, ms) => {
                    hit.combine(cx, cy, ms);
                    return Some(*hit);
                }
                Some(_) => {}
                None => best = Some(PatternHit::new(cx, cy, ms)),
            }
        }
    }
    best
}

/// Light-dark-light windows in a row slice whose runs each sit within
/// half a module of the expected single-module width.
fn scan_row(
    matrix: &Bitmap,
    y: usize,
    min_x: usize,
    max_x: usize,
    module_size: f32,
) -> Vec<(f32, f32)> {
    let mut runs: Vec<(usize, bool, usize)> = Vec::new(); // (len, dark, end)
    let mut run_start = min_x;
    let mut current = matrix.dark(min_x, y);
    for x in min_x + 1..=max_x {
        let dark = matrix.dark(x, y);
        if dark != current {
            runs.push((x - run_start, current, x));
            run_start = x;
            current = dark;
        }
    }
    runs.push((max_x + 1 - run_start, current, max_x + 1));

    let mut out = Vec::new();
    for i in 0..runs.len().saturating_sub(2) {
        let (l0, d0, _) = runs[i];
        let (l1, d1, end1) = runs[i + 1];
        let (l2, d2, _) = runs[i + 2];
        if d0 || !d1 || d2 {
            continue;
        }
        if !(run_ok(l0, module_size) && run_ok(l1, module_size) && run_ok(l2, module_size)) {
            continue;
        }
        let center = end1 as f32 - l1 as f32 / 2.0;
        out.push((center, (l0 + l1 + l2) as f32));
    }
    out
}

/// The vertical counterpart: a dark run of about one module flanked by
/// light runs, centered near `(cx, start_y)`.
fn cross_check_vertical(
    matrix: &Bitmap,
    cx: f32,
    start_y: usize,
    module_size: f32,
    half: f32,
) -> Option<(f32, f32)> {
    let x = cx.round() as isize;
    if x < 0 || x as usize >= matrix.width() {
        return None;
    }
    let x = x as usize;
    let height = matrix.height() as isize;
    let cap = (2.0 * module_size).ceil().max(2.0) as usize + (half as usize);

    let mut dark_run = 0usize;
    let mut above = 0usize;
    let mut below = 0usize;

    let mut y = start_y as isize;
    if !matrix.dark(x, y as usize) {
        return None;
    }
    while y >= 0 && matrix.dark(x, y as usize) && dark_run <= cap {
        dark_run += 1;
        y -= 1;
    }
    while y >= 0 && !matrix.dark(x, y as usize) && above <= cap {
        above += 1;
        y -= 1;
    }
    let top = y;
    let mut y = start_y as isize + 1;
    while y < height && matrix.dark(x, y as usize) && dark_run <= cap {
        dark_run += 1;
        y += 1;
    }
    while y < height && !matrix.dark(x, y as usize) && below <= cap {
        below += 1;
        y += 1;
    }

    if above == 0 || below == 0 {
        return None;
    }
    if !run_ok(dark_run, module_size) {
        return None;
    }
    let center = (top + 1) as f32 + above as f32 + dark_run as f32 / 2.0;
    Some((center, (dark_run + above + below) as f32))
}

fn run_ok(len: usize, module_size: f32) -> bool {
    (len as f32 - module_size).abs() <= (module_size / 2.0).max(1.0)
}

//! Finder pattern detection using 1:1:3:1:1 run scanning with adaptive
//! row skipping, cross-checks in three directions, and count-weighted
//! candidate merging.

use rayon::prelude::*;

use crate::debug::trace;
use crate::error::QrError;
use crate::models::{Bitmap, Point};

/// Relative run lengths of a finder cross-section.
const FINDER_RUNS: [f32; 5] = [1.0, 1.0, 3.0, 1.0, 1.0];
/// Looseness of the run-ratio test on straight scans.
const STRAIGHT_VARIANCE: f32 = 2.0;
/// Tighter looseness on diagonal scans.
const DIAGONAL_VARIANCE: f32 = 4.0 / 3.0;

/// One candidate finder (or alignment) center.
#[derive(Debug, Clone, Copy)]
pub struct PatternHit {
    /// Center x in image pixels.
    pub x: f32,
    /// Center y in image pixels.
    pub y: f32,
    /// Estimated module size in pixels at this center.
    pub module_size: f32,
    /// How many scan lines confirmed this center.
    pub count: usize,
}

impl PatternHit {
    /// A single-sighting hit.
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self { x, y, module_size, count: 1 }
    }

    /// Center as a point.
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Two hits are the same center when both coordinate deltas stay
    /// within a module and the size difference is small in absolute or
    /// relative terms.
    pub fn about_equals(&self, x: f32, y: f32, module_size: f32) -> bool {
        if (self.x - x).abs() <= self.module_size && (self.y - y).abs() <= self.module_size {
            let diff = (self.module_size - module_size).abs();
            diff <= 1.0 || diff <= self.module_size.min(module_size)
        } else {
            false
        }
    }

    /// Fold another sighting in by count-weighted averaging.
    pub fn combine(&mut self, x: f32, y: f32, module_size: f32) {
        let n = self.count as f32;
        self.x = (n * self.x + x) / (n + 1.0);
        self.y = (n * self.y + y) / (n + 1.0);
        self.module_size = (n * self.module_size + module_size) / (n + 1.0);
        self.count += 1;
    }
}

/// Row-scanning finder pattern locator.
pub struct FinderDetector;

impl FinderDetector {
    /// Locate the three finder centers, classified as (TL, TR, BL).
    ///
    /// Rows are scanned on an adaptive schedule: a sparse stride until the
    /// first sighting, every other row afterwards, plus one forward jump
    /// over the symbol body once two centers are confirmed.
    pub fn detect(matrix: &Bitmap) -> Result<[PatternHit; 3], QrError> {
        let height = matrix.height();
        let mut hits: Vec<PatternHit> = Vec::new();
        let mut y_skip = (3 * height / (4 * 97)).max(3);
        let mut skipped = false;

        let mut y = y_skip - 1;
        while y < height {
            for (cx, cy, ms) in Self::scan_row(matrix, y) {
                let second_confirm = Self::merge_hit(&mut hits, cx, cy, ms);
                y_skip = 2;
                if second_confirm && !skipped {
                    if let Some(jump) = Self::row_skip(&hits) {
                        skipped = true;
                        y += jump;
                    }
                }
            }
            if Self::have_confirmed_triple(&hits) {
                break;
            }
            y += y_skip;
        }

        trace!("FINDER: {} candidate centers", hits.len());
        Self::select_triple(&hits)
    }

    /// Exhaustive variant: every row scanned, rows fanned out across
    /// threads, no skip heuristics. Used as a fallback when the adaptive
    /// schedule comes up short.
    pub fn detect_parallel(matrix: &Bitmap) -> Result<[PatternHit; 3], QrError> {
        let height = matrix.height();
        let found: Vec<(f32, f32, f32)> = (0..height)
            .into_par_iter()
            .flat_map_iter(|y| Self::scan_row(matrix, y))
            .collect();

        let mut hits: Vec<PatternHit> = Vec::new();
        for (cx, cy, ms) in found {
            Self::merge_hit(&mut hits, cx, cy, ms);
        }
        Self::select_triple(&hits)
    }

    /// Merge a confirmed sighting; returns true when an existing center
    /// reached its second confirmation.
    fn merge_hit(hits: &mut Vec<PatternHit>, cx: f32, cy: f32, ms: f32) -> bool {
        for hit in hits.iter_mut() {
            if hit.about_equals(cx, cy, ms) {
                hit.combine(cx, cy, ms);
                return hit.count == 2;
            }
        }
        hits.push(PatternHit::new(cx, cy, ms));
        false
    }

    /// Scan one row for 1:1:3:1:1 candidates and cross-check each in the
    /// vertical, horizontal, and diagonal directions.
    fn scan_row(matrix: &Bitmap, y: usize) -> Vec<(f32, f32, f32)> {
        let mut out = Vec::new();
        let mut runs: Vec<(usize, bool)> = Vec::new();
        matrix.for_each_run(y, |len, dark| runs.push((len, dark)));
        if runs.len() < 5 {
            return out;
        }

        // Prefix sums give each window's end position.
        let mut end = 0usize;
        let mut ends = Vec::with_capacity(runs.len());
        for &(len, _) in &runs {
            end += len;
            ends.push(end);
        }

        for i in 0..runs.len() - 4 {
            if !runs[i].1 {
                continue;
            }
            let lengths = [runs[i].0, runs[i + 1].0, runs[i + 2].0, runs[i + 3].0, runs[i + 4].0];
            if !run_sizes_ok(&lengths, STRAIGHT_VARIANCE) {
                continue;
            }
            let end_x = ends[i + 4];
            let total: usize = lengths.iter().sum();
            let center_x =
                end_x as f32 - lengths[4] as f32 - lengths[3] as f32 - lengths[2] as f32 / 2.0;

            let Some((center_y, total_v)) =
                Self::cross_check_vertical(matrix, center_x, y, total)
            else {
                continue;
            };
            let Some((center_x, total_h)) =
                Self::cross_check_horizontal(matrix, center_x, center_y, total_v)
            else {
                continue;
            };
            if !Self::cross_check_diagonal(matrix, center_x, center_y) {
                continue;
            }
            let module_size = (total_v + total_h) / 14.0;
            out.push((center_x, center_y, module_size));
        }
        out
    }

    /// Count the five runs through `(cx, y)` going vertically; reject on
    /// truncated runs, a total off the horizontal one by more than 40%,
    /// or a failed ratio test.
    fn cross_check_vertical(
        matrix: &Bitmap,
        center_x: f32,
        center_y: usize,
        total: usize,
    ) -> Option<(f32, f32)> {
        let x = center_x.round() as isize;
        if x < 0 || x as usize >= matrix.width() {
            return None;
        }
        let x = x as usize;
        let height = matrix.height() as isize;
        let cap = 2 * total;
        let mut counts = [0usize; 5];

        let mut y = center_y as isize;
        while y >= 0 && matrix.dark(x, y as usize) && counts[2] <= cap {
            counts[2] += 1;
            y -= 1;
        }
        if y < 0 {
            return None;
        }
        while y >= 0 && !matrix.dark(x, y as usize) && counts[1] <= cap {
            counts[1] += 1;
            y -= 1;
        }
        while y >= 0 && matrix.dark(x, y as usize) && counts[0] <= cap {
            counts[0] += 1;
            y -= 1;
        }

        y = center_y as isize + 1;
        while y < height && matrix.dark(x, y as usize) && counts[2] <= cap {
            counts[2] += 1;
            y += 1;
        }
        if y >= height {
            return None;
        }
        while y < height && !matrix.dark(x, y as usize) && counts[3] <= cap {
            counts[3] += 1;
            y += 1;
        }
        while y < height && matrix.dark(x, y as usize) && counts[4] <= cap {
            counts[4] += 1;
            y += 1;
        }

        if counts.iter().any(|&c| c == 0) {
            return None;
        }
        let total_v: usize = counts.iter().sum();
        if 5 * total_v.abs_diff(total) >= 2 * total {
            return None;
        }
        if !run_sizes_ok(&counts, STRAIGHT_VARIANCE) {
            return None;
        }
        let center = y as f32 - counts[4] as f32 - counts[3] as f32 - counts[2] as f32 / 2.0;
        Some((center, total_v as f32))
    }

    /// Same test along the row through the refined vertical center.
    fn cross_check_horizontal(
        matrix: &Bitmap,
        center_x: f32,
        center_y: f32,
        total_v: f32,
    ) -> Option<(f32, f32)> {
        let y = center_y.round() as isize;
        if y < 0 || y as usize >= matrix.height() {
            return None;
        }
        let y = y as usize;
        let width = matrix.width() as isize;
        let total = total_v as usize;
        let cap = 2 * total;
        let mut counts = [0usize; 5];

        let mut x = center_x.round() as isize;
        while x >= 0 && matrix.dark(x as usize, y) && counts[2] <= cap {
            counts[2] += 1;
            x -= 1;
        }
        if x < 0 {
            return None;
        }
        while x >= 0 && !matrix.dark(x as usize, y) && counts[1] <= cap {
            counts[1] += 1;
            x -= 1;
        }
        while x >= 0 && matrix.dark(x as usize, y) && counts[0] <= cap {
            counts[0] += 1;
            x -= 1;
        }

        x = center_x.round() as isize + 1;
        while x < width && matrix.dark(x as usize, y) && counts[2] <= cap {
            counts[2] += 1;
            x += 1;
        }
        if x >= width {
            return None;
        }
        while x < width && !matrix.dark(x as usize, y) && counts[3] <= cap {
            counts[3] += 1;
            x += 1;
        }
        while x < width && matrix.dark(x as usize, y) && counts[4] <= cap {
            counts[4] += 1;
            x += 1;
        }

        if counts.iter().any(|&c| c == 0) {
            return None;
        }
        let total_h: usize = counts.iter().sum();
        if 5 * total_h.abs_diff(total) >= 2 * total {
            return None;
        }
        if !run_sizes_ok(&counts, STRAIGHT_VARIANCE) {
            return None;
        }
        let center = x as f32 - counts[4] as f32 - counts[3] as f32 - counts[2] as f32 / 2.0;
        Some((center, total_h as f32))
    }

    /// Diagonal cross-check with the tighter variance factor.
    fn cross_check_diagonal(matrix: &Bitmap, center_x: f32, center_y: f32) -> bool {
        let cx = center_x.round() as isize;
        let cy = center_y.round() as isize;
        let mut counts = [0usize; 5];
        let limit = (matrix.width() + matrix.height()) as isize;

        // Up-left.
        let mut i = 0isize;
        while cx - i >= 0 && cy - i >= 0 && matrix.dark((cx - i) as usize, (cy - i) as usize) {
            counts[2] += 1;
            i += 1;
            if i > limit {
                return false;
            }
        }
        if cx - i < 0 || cy - i < 0 {
            return false;
        }
        while cx - i >= 0 && cy - i >= 0 && !matrix.dark((cx - i) as usize, (cy - i) as usize) {
            counts[1] += 1;
            i += 1;
        }
        while cx - i >= 0 && cy - i >= 0 && matrix.dark((cx - i) as usize, (cy - i) as usize) {
            counts[0] += 1;
            i += 1;
        }

        // Down-right.
        let (w, h) = (matrix.width() as isize, matrix.height() as isize);
        i = 1;
        while cx + i < w && cy + i < h && matrix.dark((cx + i) as usize, (cy + i) as usize) {
            counts[2] += 1;
            i += 1;
        }
        while cx + i < w && cy + i < h && !matrix.dark((cx + i) as usize, (cy + i) as usize) {
            counts[3] += 1;
            i += 1;
        }
        while cx + i < w && cy + i < h && matrix.dark((cx + i) as usize, (cy + i) as usize) {
            counts[4] += 1;
            i += 1;
        }

        counts.iter().all(|&c| c > 0) && run_sizes_ok(&counts, DIAGONAL_VARIANCE)
    }

    /// Once two centers are confirmed, jump ahead by roughly the
    /// remaining horizontal gap to clear the symbol body.
    fn row_skip(hits: &[PatternHit]) -> Option<usize> {
        let confirmed: Vec<&PatternHit> = hits.iter().filter(|h| h.count >= 2).collect();
        if confirmed.len() != 2 {
            return None;
        }
        let dx = (confirmed[0].x - confirmed[1].x).abs();
        let dy = (confirmed[0].y - confirmed[1].y).abs();
        let jump = ((dx - dy) / 2.0) as isize;
        (jump > 0).then_some(jump as usize)
    }

    /// Three confirmed centers whose module sizes agree within 5% of
    /// their sum end the scan.
    fn have_confirmed_triple(hits: &[PatternHit]) -> bool {
        let confirmed: Vec<&PatternHit> = hits.iter().filter(|h| h.count >= 2).collect();
        if confirmed.len() < 3 {
            return false;
        }
        let total: f32 = confirmed.iter().map(|h| h.module_size).sum();
        let mean = total / confirmed.len() as f32;
        let deviation: f32 = confirmed.iter().map(|h| (h.module_size - mean).abs()).sum();
        deviation <= 0.05 * total
    }

    /// Pick the triple closest to an isoceles right triangle and orient
    /// it as (TL, TR, BL).
    fn select_triple(hits: &[PatternHit]) -> Result<[PatternHit; 3], QrError> {
        let confirmed: Vec<PatternHit> = hits.iter().filter(|h| h.count >= 2).copied().collect();
        let pool: &[PatternHit] = if confirmed.len() >= 3 { &confirmed } else { hits };
        if pool.len() < 3 {
            return Err(QrError::FinderNotFound);
        }

        let mut best: Option<([PatternHit; 3], f32)> = None;
        for i in 0..pool.len() {
            for j in i + 1..pool.len() {
                for k in j + 1..pool.len() {
                    let (a, b, c) = (pool[i], pool[j], pool[k]);
                    let sizes = [a.module_size, b.module_size, c.module_size];
                    let min_ms = sizes.iter().cloned().fold(f32::INFINITY, f32::min);
                    let max_ms = sizes.iter().cloned().fold(0.0, f32::max);
                    if max_ms > 1.4 * min_ms {
                        continue;
                    }
                    let mut d = [
                        (a.center() - b.center()).length_squared(),
                        (a.center() - c.center()).length_squared(),
                        (b.center() - c.center()).length_squared(),
                    ];
                    d.sort_by(|p, q| p.partial_cmp(q).unwrap());
                    let score = (d[2] - 2.0 * d[1]).abs() + (d[2] - 2.0 * d[0]).abs();
                    match best {
                        Some((_, s)) if s <= score => {}
                        _ => best = Some(([a, b, c], score)),
                    }
                }
            }
        }

        let (triple, _) = best.ok_or(QrError::FinderNotFound)?;
        Ok(Self::orient(triple))
    }

    /// The hypotenuse joins TR and BL; the remaining corner is TL. A
    /// negative cross product means the image is mirrored, so TR and BL
    /// swap.
    fn orient(triple: [PatternHit; 3]) -> [PatternHit; 3] {
        let d01 = (triple[0].center() - triple[1].center()).length_squared();
        let d02 = (triple[0].center() - triple[2].center()).length_squared();
        let d12 = (triple[1].center() - triple[2].center()).length_squared();

        let (tl, mut tr, mut bl) = if d12 >= d01 && d12 >= d02 {
            (triple[0], triple[1], triple[2])
        } else if d02 >= d01 && d02 >= d12 {
            (triple[1], triple[0], triple[2])
        } else {
            (triple[2], triple[0], triple[1])
        };

        let cross = (tr.center() - tl.center()).cross(bl.center() - tl.center());
        if cross < 0.0 {
            std::mem::swap(&mut tr, &mut bl);
        }
        [tl, tr, bl]
    }
}

/// Every run must sit within `unit / variance` of its expected share.
fn run_sizes_ok(counts: &[usize; 5], variance: f32) -> bool {
    let total: usize = counts.iter().sum();
    if total < 7 {
        return false;
    }
    let unit = total as f32 / 7.0;
    let max_dev = unit / variance;
    counts
        .iter()
        .zip(FINDER_RUNS.iter())
        .all(|(&len, &share)| (len as f32 - share * unit).abs() < share.max(1.0) * max_dev)
}

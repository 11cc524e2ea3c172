//! Mask penalty scoring.
//!
//! Sum of the four ISO rules: long same-color runs, 2x2 monochrome
//! blocks, finder-lookalike windows, and dark/light imbalance. Columns are
//! scored by running the row rules over the transpose.

use crate::models::Bitmap;

/// The two 11-bit finder-lookalike windows: 1011101 with four light
/// modules on either side.
const FINDER_WINDOWS: [u32; 2] = [0b1011_1010_000, 0b0000_1011_101];

/// Rule R1: every maximal same-color run of length >= 5 in a row costs
/// `3 + (run_len - 5)`.
fn rule_runs(m: &Bitmap) -> u32 {
    let mut total = 0u32;
    for y in 0..m.height() {
        m.for_each_run(y, |len, _| {
            if len >= 5 {
                total += 3 + (len as u32 - 5);
            }
        });
    }
    total
}

/// Rule R3: 40 per finder-lookalike window occurrence in a row.
fn rule_finder_windows(m: &Bitmap) -> u32 {
    let mut total = 0u32;
    for y in 0..m.height() {
        total += 40
            * m.count_pattern_in_row(y, 11, &FINDER_WINDOWS)
                .unwrap_or(0) as u32;
    }
    total
}

/// Rule R2: 3 per monochrome 2x2 block.
fn rule_boxes(m: &Bitmap) -> u32 {
    let mut total = 0u32;
    for y in 0..m.height() {
        total += 3 * m.count_2x2_boxes(y) as u32;
    }
    total
}

/// Rule R4: 10 per 5% step of deviation from a 50% dark share.
fn rule_balance(m: &Bitmap) -> u32 {
    let total = m.width() * m.height();
    if total == 0 {
        return 0;
    }
    let p = (100 * m.popcount() / total) as i32;
    10 * ((p - 50).unsigned_abs() / 5)
}

/// Total penalty of a fully drawn matrix; lower is better.
pub fn penalty(m: &Bitmap) -> u32 {
    let t = m.transpose();
    rule_runs(m) + rule_runs(&t) + rule_boxes(m) + rule_finder_windows(m) + rule_finder_windows(&t)
        + rule_balance(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Module;

    #[test]
    fn test_rule_runs_scoring() {
        let mut m = Bitmap::new(12, 1);
        m.fill_rect(0, 0, 12, 1, Module::Light).unwrap();
        // One run of 12 light modules: 3 + (12 - 5) = 10.
        assert_eq!(rule_runs(&m), 10);
        m.fill_rect(5, 0, 1, 1, Module::Dark).unwrap();
        // Runs of 5 and 6: (3 + 0) + (3 + 1) = 7.
        assert_eq!(rule_runs(&m), 7);
    }

    #[test]
    fn test_extra_run_adds_at_least_three() {
        let mut m = Bitmap::new(8, 2);
        m.fill_rect(0, 0, 8, 2, Module::Light).unwrap();
        for x in 0..8 {
            m.set(x, 1, Module::from_dark(x % 2 == 0)).unwrap();
        }
        let base = rule_runs(&m);
        // Turn row 1 into one more length-5 run.
        let mut worse = m.clone();
        worse.fill_rect(0, 1, 5, 1, Module::Dark).unwrap();
        assert!(rule_runs(&worse) >= base + 3);
    }

    #[test]
    fn test_rule_boxes() {
        let mut m = Bitmap::new(4, 4);
        m.fill_rect(0, 0, 4, 4, Module::Light).unwrap();
        // A 4x4 monochrome field has 9 anchors.
        assert_eq!(rule_boxes(&m), 27);
    }

    #[test]
    fn test_rule_finder_windows() {
        let mut m = Bitmap::new(11, 1);
        m.fill_rect(0, 0, 11, 1, Module::Light).unwrap();
        for &x in &[0, 2, 3, 4, 6] {
            m.set(x, 0, Module::Dark).unwrap();
        }
        // 1011101 followed by 0000.
        assert_eq!(rule_finder_windows(&m), 40);
    }

    #[test]
    fn test_rule_balance() {
        let mut m = Bitmap::new(10, 10);
        m.fill_rect(0, 0, 10, 10, Module::Light).unwrap();
        // 0% dark: |0 - 50| / 5 = 10 steps.
        assert_eq!(rule_balance(&m), 100);
        m.fill_rect(0, 0, 10, 5, Module::Dark).unwrap();
        assert_eq!(rule_balance(&m), 0);
    }
}

//! Mask evaluation.
//!
//! Every candidate is scored with the four penalty rules of ISO/IEC 18004
//! 7.8.3 over the whole symbol, format information included.

use rayon::prelude::*;

use super::format;
use super::placement::Canvas;
use crate::config;
use crate::models::{BitMatrix, ECLevel, MaskPattern, QRCode};

const PENALTY_N1: u32 = 3;
const PENALTY_N2: u32 = 3;
const PENALTY_N3: u32 = 40;
const PENALTY_N4: u32 = 10;

/// Penalty breakdown for one candidate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Penalty {
    /// Runs of 5+ same-colour modules in a row or column
    pub runs: u32,
    /// 2x2 same-colour blocks
    pub blocks: u32,
    /// 1:1:3:1:1 finder-like patterns with a light border
    pub finder_like: u32,
    /// Dark/light imbalance
    pub balance: u32,
}

impl Penalty {
    pub fn total(&self) -> u32 {
        self.runs + self.blocks + self.finder_like + self.balance
    }
}

/// Sliding window of the last seven run lengths along a line, used to spot
/// finder-like patterns. The area outside the symbol counts as light.
struct RunHistory {
    size: usize,
    runs: [usize; 7],
}

impl RunHistory {
    fn new(size: usize) -> Self {
        Self { size, runs: [0; 7] }
    }

    fn push(&mut self, mut run: usize) {
        if self.runs[0] == 0 {
            // First run of the line borders the light outside
            run += self.size;
        }
        self.runs.copy_within(0..6, 1);
        self.runs[0] = run;
    }

    /// Finder-like patterns ending at the most recent light run
    fn count_patterns(&self) -> u32 {
        let r = &self.runs;
        let n = r[1];
        let core = n > 0 && r[2] == n && r[3] == n * 3 && r[4] == n && r[5] == n;
        u32::from(core && r[0] >= n * 4 && r[6] >= n) + u32::from(core && r[6] >= n * 4 && r[0] >= n)
    }

    fn finish(mut self, dark: bool, mut run: usize) -> u32 {
        if dark {
            self.push(run);
            run = 0;
        }
        self.push(run + self.size);
        self.count_patterns()
    }
}

fn score_line(size: usize, module: impl Fn(usize) -> bool, penalty: &mut Penalty) {
    let mut run_dark = false;
    let mut run = 0usize;
    let mut history = RunHistory::new(size);
    for i in 0..size {
        if module(i) == run_dark {
            run += 1;
            if run == 5 {
                penalty.runs += PENALTY_N1;
            } else if run > 5 {
                penalty.runs += 1;
            }
        } else {
            history.push(run);
            if !run_dark {
                penalty.finder_like += history.count_patterns() * PENALTY_N3;
            }
            run_dark = module(i);
            run = 1;
        }
    }
    penalty.finder_like += history.finish(run_dark, run) * PENALTY_N3;
}

/// Score a finished module grid
pub fn penalty_breakdown(modules: &BitMatrix) -> Penalty {
    let size = modules.width();
    let mut penalty = Penalty::default();

    for y in 0..size {
        score_line(size, |x| modules.get(x, y), &mut penalty);
    }
    for x in 0..size {
        score_line(size, |y| modules.get(x, y), &mut penalty);
    }

    for y in 0..size.saturating_sub(1) {
        for x in 0..size - 1 {
            let c = modules.get(x, y);
            if c == modules.get(x + 1, y) && c == modules.get(x, y + 1) && c == modules.get(x + 1, y + 1)
            {
                penalty.blocks += PENALTY_N2;
            }
        }
    }

    let total = (size * size) as i64;
    if total > 0 {
        let dark = modules.count_ones() as i64;
        // Smallest k with (45 - 5k)% <= dark <= (55 + 5k)%
        let k = ((dark * 20 - total * 10).abs() + total - 1) / total - 1;
        penalty.balance = k.max(0) as u32 * PENALTY_N4;
    }
    penalty
}

/// Total penalty of a finished module grid
pub fn penalty_score(modules: &BitMatrix) -> u32 {
    penalty_breakdown(modules).total()
}

/// Lowest penalty wins; ties go to the lowest mask index.
pub fn select_mask(penalties: &[u32; 8]) -> MaskPattern {
    let best = (0..8usize)
        .min_by_key(|&i| (penalties[i], i))
        .unwrap_or(0);
    MaskPattern::ALL[best]
}

fn score_candidate(unmasked: &Canvas, ec_level: ECLevel, mask: MaskPattern) -> u32 {
    let mut candidate = unmasked.clone();
    candidate.apply_mask(mask);
    format::write_format(&mut candidate, ec_level, mask);
    let score = penalty_score(candidate.modules());
    tracing::trace!(mask = mask.index(), score, "mask candidate scored");
    score
}

/// Penalties of all eight masks applied to an unmasked canvas
pub fn evaluate_masks(unmasked: &Canvas, ec_level: ECLevel) -> [u32; 8] {
    let parallel =
        config::parallel_masks() && unmasked.version().number() >= config::parallel_min_version();
    let scores: Vec<u32> = if parallel {
        MaskPattern::ALL[..]
            .par_iter()
            .map(|&mask| score_candidate(unmasked, ec_level, mask))
            .collect()
    } else {
        MaskPattern::ALL
            .iter()
            .map(|&mask| score_candidate(unmasked, ec_level, mask))
            .collect()
    };
    let mut penalties = [0u32; 8];
    penalties.copy_from_slice(&scores);
    penalties
}

/// Recompute all eight candidate penalties for a finished symbol by
/// stripping its mask and trying each pattern again.
pub fn candidate_penalties(code: &QRCode) -> [u32; 8] {
    let mut canvas = Canvas::new(code.version);
    let size = canvas.size();
    for y in 0..size {
        for x in 0..size {
            if !canvas.is_reserved(x, y) {
                let unmasked = code.modules.get(x, y) ^ code.mask_pattern.is_masked(y, x);
                canvas.set_data(x, y, unmasked);
            }
        }
    }
    evaluate_masks(&canvas, code.error_correction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_mask_tie_prefers_lowest_index() {
        let penalties = [500, 420, 300, 300, 999, 300, 301, 1000];
        assert_eq!(select_mask(&penalties), MaskPattern::Pattern2);
        assert_eq!(select_mask(&[7; 8]), MaskPattern::Pattern0);
        let mut last_best = [50; 8];
        last_best[7] = 49;
        assert_eq!(select_mask(&last_best), MaskPattern::Pattern7);
    }

    #[test]
    fn test_all_light_grid_penalties() {
        // 21x21 light: each line is one run of 21 -> 3 + 16
        let m = BitMatrix::square(21);
        let p = penalty_breakdown(&m);
        assert_eq!(p.runs, 42 * (3 + 16));
        assert_eq!(p.blocks, 20 * 20 * 3);
        assert_eq!(p.finder_like, 0);
        // 0% dark -> k = 9
        assert_eq!(p.balance, 90);
    }

    #[test]
    fn test_checkerboard_has_no_run_or_block_penalty() {
        let mut m = BitMatrix::square(21);
        for y in 0..21 {
            for x in 0..21 {
                m.set(x, y, (x + y) % 2 == 0);
            }
        }
        let p = penalty_breakdown(&m);
        assert_eq!(p.runs, 0);
        assert_eq!(p.blocks, 0);
        assert_eq!(p.finder_like, 0);
        // 221 of 441 dark: within 45-55%
        assert_eq!(p.balance, 0);
    }

    #[test]
    fn test_finder_like_pattern_in_row() {
        // Row 0: dark 1:1:3:1:1 at columns 0..7, rest light (light border on
        // the left comes from outside the symbol).
        let mut m = BitMatrix::square(21);
        for x in [0, 2, 3, 4, 6] {
            m.set(x, 0, true);
        }
        let mut only_row = Penalty::default();
        score_line(21, |x| m.get(x, 0), &mut only_row);
        assert_eq!(only_row.finder_like, 2 * PENALTY_N3);
    }
}

//! Scoring module
//! Turns matched indices into highlight ranges and a rank

use std::cmp::Ordering;
use std::ops::RangeInclusive;

/// Coverage weight
pub const K1: f64 = 40.0;
/// Bonus for a match starting at the first character
pub const K2: f64 = 8.0;
/// Fragmentation weight
pub const K3: f64 = 20.0;

/// Rank of a match, higher is better.
///
/// A match covering the whole source text has no finite coverage term, so it is
/// placed in a category above every partial match; within a category the
/// remaining terms decide.
#[derive(Debug, Clone, Copy)]
pub struct Score {
    full_coverage: bool,
    value: f64,
}

impl Score {
    pub const ZERO: Score = Score {
        full_coverage: false,
        value: 0.0,
    };

    pub fn is_full_coverage(&self) -> bool {
        self.full_coverage
    }

    /// The finite part of the score (for full coverage, the bonuses only)
    pub fn value(&self) -> f64 {
        self.value
    }
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.full_coverage
            .cmp(&other.full_coverage)
            .then_with(|| self.value.total_cmp(&other.value))
    }
}

/// Score a match given its ascending ranges and the source length in characters
pub fn score(ranges: &[RangeInclusive<usize>], source_len: usize) -> Score {
    let covered: usize = ranges.iter().map(|r| r.end() - r.start() + 1).sum();

    let mut value = 0.0;
    let full_coverage = covered >= source_len;
    if !full_coverage {
        value += K1 / (source_len - covered) as f64;
    }

    if let Some(first) = ranges.first() {
        if *first.start() == 0 {
            value += K2;
        }
        value += K3 / ranges.len() as f64;
    }

    Score {
        full_coverage,
        value,
    }
}

/// Merge ascending indices into inclusive runs, e.g. `[1,2,3,5,7,8]` -> `[1..=3, 5..=5, 7..=8]`
pub fn to_ranges(indices: &[usize]) -> Vec<RangeInclusive<usize>> {
    let mut ranges = Vec::new();
    let Some((&first, rest)) = indices.split_first() else {
        return ranges;
    };

    let (mut start, mut end) = (first, first);
    for &i in rest {
        if i == end + 1 {
            end = i;
        } else {
            ranges.push(start..=end);
            start = i;
            end = i;
        }
    }
    ranges.push(start..=end);
    ranges
}

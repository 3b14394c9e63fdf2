//! Alignment module
//! Dynamic-programming matcher between a typed query and a romanized text

use crate::romanize::{RomanizedText, RomanizedUnit, UnitKind};

/// Longest romanization of a single character ("zhuang", "chuang", ...)
pub const MAX_ROMANIZATION_LEN: usize = 6;

/// Matched unit indices for one cell, `None` meaning the cell is unreachable
type Cell = Option<Vec<usize>>;

/// Align `query` against `text`.
///
/// Returns the strictly increasing unit indices consumed by the best alignment,
/// or `None` when the query cannot be produced from the text. `query` must
/// already be normalised (lower-case, no whitespace); an empty query never matches.
///
/// Only two rows of the table are alive at a time: `prev[j]` holds the matched
/// indices after consuming `j` query characters using units before the current one.
pub fn align(text: &RomanizedText, query: &[char]) -> Option<Vec<usize>> {
    let m = query.len();
    if m == 0 {
        return None;
    }

    // Sentinel row: a match may start at any unit.
    let mut prev: Vec<Cell> = vec![Some(Vec::new()); m + 1];

    for (i, unit) in text.units().iter().enumerate() {
        let mut cur: Vec<Cell> = vec![None; m + 1];
        cur[0] = Some(Vec::new());

        // Separators may be skipped without consuming query characters.
        if unit.is_separator() {
            cur[..m].clone_from_slice(&prev[..m]);
        }

        for j in 0..m {
            let Some(base) = prev[j].as_ref() else { continue };
            // Past the first query character, only extend an existing partial match.
            if j != 0 && base.is_empty() {
                continue;
            }

            let qc = query[j];

            if unit.character == qc {
                let matched = extend(base, i);
                if j + 1 == m {
                    return Some(matched);
                }
                keep_longest(&mut cur[j + 1], matched);
            }

            if unit.kind == UnitKind::Plain {
                continue;
            }

            let tail = &query[j..];
            if tail.len() <= MAX_ROMANIZATION_LEN
                && unit.candidates.iter().any(|c| starts_with_chars(c, tail))
            {
                // The rest of the query is an incomplete spelling of this unit.
                return Some(extend(base, i));
            }

            if unit.candidates.iter().any(|c| c.starts_with(qc)) {
                keep_longest(&mut cur[j + 1], extend(base, i));
            }

            if let Some(len) = full_syllable_len(unit, tail) {
                keep_longest(&mut cur[j + len], extend(base, i));
            }
        }

        prev = cur;
    }

    None
}

fn extend(base: &[usize], index: usize) -> Vec<usize> {
    let mut matched = Vec::with_capacity(base.len() + 1);
    matched.extend_from_slice(base);
    matched.push(index);
    matched
}

/// Longer list wins; on a tie the first one recorded stays
fn keep_longest(cell: &mut Cell, matched: Vec<usize>) {
    match cell {
        Some(existing) if existing.len() >= matched.len() => {}
        _ => *cell = Some(matched),
    }
}

/// Whether `candidate` begins with every character of `prefix`
fn starts_with_chars(candidate: &str, prefix: &[char]) -> bool {
    let mut chars = candidate.chars();
    prefix.iter().all(|p| chars.next() == Some(*p))
}

/// Character length of the first candidate spelled out in full at the head of `tail`
fn full_syllable_len(unit: &RomanizedUnit, tail: &[char]) -> Option<usize> {
    unit.candidates.iter().find_map(|candidate| {
        let len = candidate.chars().count();
        (len <= tail.len() && starts_with_chars(candidate, &tail[..len])).then_some(len)
    })
}

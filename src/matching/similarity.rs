//! Normalized string similarity.
//!
//! Uses the `similar` crate (Myers diff) over Unicode scalar values to find a
//! longest common subsequence `M`, and scores `2 * M / (len(a) + len(b))`.

use similar::{capture_diff_slices, Algorithm, DiffOp};

/// Similarity of two strings in `[0, 1]`.
///
/// Symmetric, `1.0` for identical strings (including two empty strings) and
/// above `0.0` whenever the strings share at least one character.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = common_subsequence_len(&a, &b);
    ratio(2 * matches, total)
}

/// Number of elements in a longest common subsequence of `a` and `b`
fn common_subsequence_len(a: &[char], b: &[char]) -> usize {
    capture_diff_slices(Algorithm::Myers, a, b)
        .iter()
        .map(|op| match *op {
            DiffOp::Equal { len, .. } => len,
            _ => 0,
        })
        .sum()
}

#[inline]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    {
        numerator as f64 / denominator as f64
    }
}

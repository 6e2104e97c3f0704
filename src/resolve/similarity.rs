use std::collections::HashSet;

/// Fixed score contributed when one string contains the other. Deliberately
/// coarse: a one-character substring scores the same as a near-total overlap.
pub const CONTAINMENT_SCORE: f64 = 0.8;

/// Composite similarity in `[0.0, 1.0]`: the maximum of the sequence ratio, the
/// containment score (when one contains the other) and the character-set
/// Jaccard overlap (when the sets intersect). Empty input scores 0.0.
pub fn score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut best = sequence_ratio(a, b);
    if let Some(s) = containment(a, b) {
        best = best.max(s);
    }
    if let Some(s) = char_jaccard(a, b) {
        best = best.max(s);
    }
    best
}

/// `2 * M / (len(a) + len(b))` where `M` is the number of characters covered by
/// the matching blocks found by recursively taking the longest common run.
/// Both argument orders are aligned and the better alignment is kept, so the
/// ratio is symmetric.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }
    let matched = matched_chars(&a, &b).max(matched_chars(&b, &a));
    2.0 * matched as f64 / total as f64
}

pub fn containment(a: &str, b: &str) -> Option<f64> {
    (a.contains(b) || b.contains(a)).then_some(CONTAINMENT_SCORE)
}

/// Shared unique characters over all unique characters; `None` when the two
/// character sets are disjoint.
pub fn char_jaccard(a: &str, b: &str) -> Option<f64> {
    let sa: HashSet<char> = a.chars().collect();
    let sb: HashSet<char> = b.chars().collect();
    let shared = sa.intersection(&sb).count();
    if shared == 0 {
        return None;
    }
    let union = sa.union(&sb).count();
    Some(shared as f64 / union as f64)
}

fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    matched
}

/// Longest common run of `a[alo..ahi]` and `b[blo..bhi]`. Among equally long
/// runs the one ending earliest in `a`, then earliest in `b`, wins.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // run[j - blo + 1] = length of the common run ending at (i, j)
    let mut prev = vec![0usize; bhi - blo + 1];
    let mut cur = vec![0usize; bhi - blo + 1];
    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let k = prev[slot - 1] + 1;
                cur[slot] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            } else {
                cur[slot] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    (best_i, best_j, best_k)
}

//! String similarity metrics used by the candidate scorer
//!
//! Ratio-style metrics are on a 0-100 scale and built on normalized
//! Levenshtein similarity; word-set metrics are on 0-1. Inputs are expected to
//! be normalized already (lowercase, single spaces).

use std::collections::BTreeSet;

/// Whole-string similarity, 0-100
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

/// Best similarity of the shorter string against every equally long window
/// of the longer one, 0-100
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if shorter.is_empty() {
        return 0.0;
    }
    if shorter.len() == longer.len() {
        return ratio(a, b);
    }

    let needle: String = shorter.iter().collect();
    let mut best: f64 = 0.0;
    for window in longer.windows(shorter.len()) {
        let window: String = window.iter().collect();
        best = best.max(ratio(&needle, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

/// Order- and duplicate-insensitive token similarity, 0-100
///
/// Compares the shared tokens against each side's full token set, so a title
/// that is a word subset of the other scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a_tokens = token_set(a);
    let b_tokens = token_set(b);
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }

    let shared = join(a_tokens.intersection(&b_tokens));
    let only_a = join(a_tokens.difference(&b_tokens));
    let only_b = join(b_tokens.difference(&a_tokens));

    let with_a = join_nonempty(&shared, &only_a);
    let with_b = join_nonempty(&shared, &only_b);

    ratio(&shared, &with_a)
        .max(ratio(&shared, &with_b))
        .max(ratio(&with_a, &with_b))
}

/// Similarity after sorting tokens, 0-100
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// |A ∩ B| / |A ∪ B| over word sets, 0-1
pub fn jaccard(a: &str, b: &str) -> f64 {
    let a_tokens = token_set(a);
    let b_tokens = token_set(b);
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let shared = a_tokens.intersection(&b_tokens).count();
    let union = a_tokens.union(&b_tokens).count();
    shared as f64 / union as f64
}

/// Fraction of the smaller word set found in the larger, 0-1
pub fn word_overlap(a: &str, b: &str) -> f64 {
    let a_tokens = token_set(a);
    let b_tokens = token_set(b);
    let smaller = a_tokens.len().min(b_tokens.len());
    if smaller == 0 {
        return 0.0;
    }
    a_tokens.intersection(&b_tokens).count() as f64 / smaller as f64
}

/// Share of tokens that contain, or are contained in, a token of the other
/// title, 0-1
///
/// Only tokens of at least `min_len` chars take part; the denominator is the
/// token count of both titles together.
pub fn cross_token(a: &str, b: &str, min_len: usize) -> f64 {
    let a_tokens = token_set(a);
    let b_tokens = token_set(b);
    let total = a_tokens.len() + b_tokens.len();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }

    let a_long = long_tokens(&a_tokens, min_len);
    let b_long = long_tokens(&b_tokens, min_len);

    let a_hits = a_long
        .iter()
        .filter(|x| b_long.iter().any(|y| overlaps(x, y)))
        .count();
    let b_hits = b_long
        .iter()
        .filter(|y| a_long.iter().any(|x| overlaps(x, y)))
        .count();

    (a_hits + b_hits) as f64 / total as f64
}

/// One title literally contains the other
pub fn contains_either(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

fn long_tokens<'a>(tokens: &BTreeSet<&'a str>, min_len: usize) -> Vec<&'a str> {
    tokens
        .iter()
        .copied()
        .filter(|t| t.chars().count() >= min_len)
        .collect()
}

fn overlaps(x: &str, y: &str) -> bool {
    x.contains(y) || y.contains(x)
}

fn token_set(s: &str) -> BTreeSet<&str> {
    s.split_whitespace().collect()
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{} {}", head, tail),
    }
}

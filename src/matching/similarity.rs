// src/matching/similarity.rs

/// Edit distance over chars (insert / delete / substitute, all cost 1).
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    strsim::levenshtein(s1, s2)
}

/// Normalized similarity in [0, 1]: `(max_len - distance) / max_len`.
///
/// Two empty strings score 1.0, an empty string against a non-empty one scores
/// 0.0. Lengths are counted in chars, consistent with the distance.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

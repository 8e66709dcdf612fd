use log::trace;

use super::tables::{are_homophones, phonetic_reduce};

/// Score returned when two words reduce to the same phonetic form.
pub const PHONETIC_MATCH_SCORE: f64 = 0.9;

/// Lowercases, drops everything but letters, digits and whitespace, and
/// collapses runs of whitespace.
pub fn normalize(word: &str) -> String {
    let filtered: String = word
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    filtered.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// Unit-cost Levenshtein distance, counted in chars.
pub fn edit_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - distance / longest`, with two empty strings scoring 1.0.
pub fn edit_similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// Word similarity in [0, 1] using the exact, homophone, phonetic and
/// edit-distance fallbacks in that order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScorer {
    phonetic_threshold: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(0.9)
    }
}

impl SimilarityScorer {
    pub fn new(phonetic_threshold: f64) -> Self {
        Self { phonetic_threshold }
    }

    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = normalize(a);
        let b = normalize(b);

        if a == b {
            return 1.0;
        }
        if are_homophones(&a, &b) {
            return 1.0;
        }

        let reduced_a = phonetic_reduce(&a);
        let reduced_b = phonetic_reduce(&b);
        if reduced_a == reduced_b {
            return PHONETIC_MATCH_SCORE;
        }
        let phonetic = edit_similarity(&reduced_a, &reduced_b);
        if phonetic >= self.phonetic_threshold {
            trace!("{a:?} ~ {b:?} phonetically ({reduced_a:?}/{reduced_b:?}) = {phonetic:.2}");
            return phonetic;
        }

        edit_similarity(&a, &b)
    }
}

/// Similarity with the default phonetic threshold.
pub fn similarity(a: &str, b: &str) -> f64 {
    SimilarityScorer::default().similarity(a, b)
}

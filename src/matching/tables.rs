use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Groups of words that sound alike. Entries are in normalized form
/// (lowercase, punctuation stripped), so "they're" is listed as "theyre".
const HOMOPHONE_GROUPS: &[&[&str]] = &[
    &["there", "their", "theyre"],
    &["to", "too", "two", "2"],
    &["your", "youre"],
    &["here", "hear"],
    &["where", "wear"],
    &["wheres", "wears"],
    &["no", "know"],
    &["by", "bye", "buy"],
    &["for", "four", "4"],
    &["one", "won", "1"],
    &["right", "write"],
    &["see", "sea"],
    &["zero", "0"],
    &["three", "3"],
    &["five", "5"],
    &["six", "6"],
    &["seven", "7"],
    &["eight", "8", "ate"],
    &["nine", "9"],
    &["ten", "10"],
];

/// Sound-alike substitutions, applied in order to the whole word.
pub const PHONETIC_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("th", "d"),
    ("f", "p"),
    ("v", "b"),
    ("s", "sh"),
    ("z", "s"),
    ("ing", "in"),
    ("ed", "d"),
];

static HOMOPHONE_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    HOMOPHONE_GROUPS
        .iter()
        .enumerate()
        .flat_map(|(group, words)| words.iter().map(move |w| (*w, group)))
        .collect()
});

/// Whether two normalized words belong to the same homophone group.
/// The relation is symmetric because membership is by group.
pub fn are_homophones(a: &str, b: &str) -> bool {
    match (HOMOPHONE_INDEX.get(a), HOMOPHONE_INDEX.get(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

pub fn phonetic_reduce(word: &str) -> String {
    PHONETIC_SUBSTITUTIONS
        .iter()
        .fold(word.to_owned(), |acc, (from, to)| acc.replace(from, to))
}

/// Every listed homophone pair, for tests.
#[cfg(test)]
pub(crate) fn homophone_pairs() -> Vec<(&'static str, &'static str)> {
    HOMOPHONE_GROUPS
        .iter()
        .flat_map(|group| {
            group
                .iter()
                .flat_map(move |a| group.iter().map(move |b| (*a, *b)))
        })
        .filter(|(a, b)| a != b)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_word_is_in_one_group() {
        let total: usize = HOMOPHONE_GROUPS.iter().map(|g| g.len()).sum();
        assert_eq!(HOMOPHONE_INDEX.len(), total);
    }

    #[test]
    fn homophones_are_symmetric() {
        for (a, b) in homophone_pairs() {
            assert!(are_homophones(a, b), "{a} ~ {b}");
            assert!(are_homophones(b, a), "{b} ~ {a}");
        }
        assert!(!are_homophones("to", "there"));
        assert!(!are_homophones("cat", "cat"));
    }

    #[test]
    fn reduction_applies_in_order() {
        assert_eq!(phonetic_reduce("thing"), "din");
        // "z" becomes "s" after the "s" rule already ran, so it stays "s".
        assert_eq!(phonetic_reduce("zoo"), "soo");
        assert_eq!(phonetic_reduce("sat"), "shat");
        assert_eq!(phonetic_reduce("jumped"), "jumpd");
        assert_eq!(phonetic_reduce("very"), "bery");
    }
}

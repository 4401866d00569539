use std::collections::HashSet;

/// Function words that carry no topical signal when comparing two sentences.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "in", "on", "at", "to", "for", "by", "and", "or", "is", "are", "was",
    "were", "be", "been", "it", "its", "this", "that", "with", "as", "from", "our", "we", "their",
];

/// Jaccard index of two word sets; two empty sets are identical.
pub fn jaccard<T: Eq + std::hash::Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.union(b).count();

    intersection as f64 / union as f64
}

/// Lowercased topical words of a sentence, without numbers, punctuation or stopwords.
pub fn content_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| w.chars().count() > 1)
        .filter(|w| !w.chars().all(|c| c.is_ascii_digit()))
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .collect()
}

/// Fuzzy word-overlap score that handles verb-form differences.
/// Words match when one is a prefix of the other (min 3 chars), so
/// "deliver" and "delivered" count as the same word.
pub fn fuzzy_overlap_score(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split_whitespace().filter(|w| w.len() > 1).collect();
    let words_b: Vec<&str> = b.split_whitespace().filter(|w| w.len() > 1).collect();

    if words_a.is_empty() && words_b.is_empty() {
        return 1.0;
    }
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let matched_a = words_a
        .iter()
        .filter(|wa| words_b.iter().any(|wb| fuzzy_word_match(wa, wb)))
        .count();
    let matched_b = words_b
        .iter()
        .filter(|wb| words_a.iter().any(|wa| fuzzy_word_match(wa, wb)))
        .count();

    let total_unique = words_a.len() + words_b.len() - matched_a.min(matched_b);
    let total_matched = matched_a.max(matched_b);

    total_matched as f64 / total_unique as f64
}

pub(crate) fn fuzzy_word_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let min_len = a.len().min(b.len());
    if min_len < 3 {
        return false;
    }
    a.starts_with(b) || b.starts_with(a)
}

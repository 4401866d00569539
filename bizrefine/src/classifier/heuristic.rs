use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::NliBackend;
use crate::consistency::utils::{content_words, fuzzy_overlap_score, jaccard};
use crate::consistency::{NliLabel, NliPrediction};
use crate::error::Result;

const STRONG_SCORE: f32 = 0.9;
const WEAK_SCORE: f32 = 0.45;
const NEUTRAL_SCORE: f32 = 0.7;
const ENTAILMENT_OVERLAP: f64 = 0.9;

/// Strength of a pattern-matched contradiction signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    None,
    /// Possible but uncertain contradiction.
    Weak,
    /// Pattern-matched contradiction.
    Strong,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Weak => write!(f, "weak"),
            Self::Strong => write!(f, "strong"),
        }
    }
}

/// Words that flip the polarity of a statement. Contractions ending in
/// "n't" are recognised separately.
const NEGATORS: &[&str] = &[
    "not", "no", "never", "cannot", "none", "nobody", "nothing", "neither", "nor", "without",
];

/// Helper verbs dropped when comparing a statement with its negation.
const AUXILIARIES: &[&str] = &[
    "do", "does", "did", "is", "are", "was", "were", "will", "can", "could", "would", "should",
    "has", "have", "had", "be", "been", "longer",
];

/// Opposing terms common in business writing.
const ANTONYM_PAIRS: &[(&str, &str)] = &[
    ("increase", "decrease"),
    ("increased", "decreased"),
    ("increasing", "decreasing"),
    ("rise", "fall"),
    ("rose", "fell"),
    ("risen", "fallen"),
    ("grew", "shrank"),
    ("growth", "decline"),
    ("grow", "decline"),
    ("higher", "lower"),
    ("more", "less"),
    ("above", "below"),
    ("ahead", "behind"),
    ("profit", "loss"),
    ("profitable", "unprofitable"),
    ("gain", "loss"),
    ("surplus", "deficit"),
    ("approved", "rejected"),
    ("accept", "reject"),
    ("accepted", "rejected"),
    ("success", "failure"),
    ("succeeded", "failed"),
    ("complete", "incomplete"),
    ("completed", "delayed"),
    ("early", "late"),
    ("available", "unavailable"),
    ("possible", "impossible"),
    ("legal", "illegal"),
    ("always", "never"),
    ("all", "none"),
    ("true", "false"),
    ("open", "closed"),
    ("enabled", "disabled"),
    ("active", "inactive"),
    ("likes", "dislikes"),
    ("likes", "hates"),
    ("loves", "hates"),
    ("supports", "opposes"),
    ("hot", "cold"),
    ("fast", "slow"),
];

const PIVOTS: &[&str] = &["is", "are", "was", "were"];

/// Offline NLI stand-in built from pattern matching.
///
/// Catches negations ("X grew" vs "X did not grow"), antonym swaps
/// ("revenue increased" vs "revenue decreased") and value swaps ("the lead
/// is Alice" vs "the lead is Bob"). No model, no network.
#[derive(Debug, Clone, Default)]
pub struct HeuristicNli;

impl HeuristicNli {
    pub fn new() -> Self {
        Self
    }

    /// Label an ordered pair.
    ///
    /// Strong signals become CONTRADICTION with high confidence, weak ones
    /// CONTRADICTION with a confidence under the default merge threshold.
    pub fn classify(&self, premise: &str, hypothesis: &str) -> NliPrediction {
        let a = tokens(premise);
        let b = tokens(hypothesis);

        match self.assess_tokens(&a, &b) {
            Signal::Strong => return NliPrediction::new(NliLabel::Contradiction, STRONG_SCORE),
            Signal::Weak => return NliPrediction::new(NliLabel::Contradiction, WEAK_SCORE),
            Signal::None => {}
        }

        let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
        let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();
        let overlap = jaccard(&set_a, &set_b);
        if !a.is_empty() && overlap >= ENTAILMENT_OVERLAP {
            return NliPrediction::new(NliLabel::Entailment, overlap as f32);
        }

        NliPrediction::new(NliLabel::Neutral, NEUTRAL_SCORE)
    }

    /// Contradiction signal between two sentences.
    pub fn assess(&self, premise: &str, hypothesis: &str) -> Signal {
        self.assess_tokens(&tokens(premise), &tokens(hypothesis))
    }

    fn assess_tokens(&self, a: &[String], b: &[String]) -> Signal {
        if a == b {
            return Signal::None;
        }

        [
            negation_signal(a, b),
            antonym_signal(a, b),
            value_swap_signal(a, b),
        ]
        .into_iter()
        .find(|signal| *signal != Signal::None)
        .unwrap_or(Signal::None)
    }
}

#[async_trait]
impl NliBackend for HeuristicNli {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn predict(&self, premise: &str, hypothesis: &str) -> Result<NliPrediction> {
        Ok(self.classify(premise, hypothesis))
    }
}

fn tokens(text: &str) -> Vec<String> {
    text.replace('’', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '%'))
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_negator(word: &str) -> bool {
    NEGATORS.contains(&word) || word.ends_with("n't")
}

fn has_negation(words: &[String]) -> bool {
    words.iter().any(|w| is_negator(w))
}

fn without_polarity(words: &[String]) -> String {
    words
        .iter()
        .filter(|w| !is_negator(w) && !AUXILIARIES.contains(&w.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// One side negated, the rest of the statement the same.
fn negation_signal(a: &[String], b: &[String]) -> Signal {
    if has_negation(a) == has_negation(b) {
        return Signal::None;
    }
    if fuzzy_overlap_score(&without_polarity(a), &without_polarity(b)) >= 0.5 {
        Signal::Strong
    } else {
        Signal::None
    }
}

fn antonym_signal(a: &[String], b: &[String]) -> Signal {
    let has = |words: &[String], term: &str| words.iter().any(|w| w == term);

    for &(left, right) in ANTONYM_PAIRS {
        let crossed = (has(a, left) && has(b, right) && !has(a, right) && !has(b, left))
            || (has(a, right) && has(b, left) && !has(a, left) && !has(b, right));
        if !crossed {
            continue;
        }

        let rest = |words: &[String]| -> String {
            words
                .iter()
                .filter(|w| *w != left && *w != right)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" ")
        };
        let overlap = jaccard(&content_words(&rest(a)), &content_words(&rest(b)));
        if overlap > 0.5 {
            return Signal::Strong;
        }
        if overlap > 0.3 {
            return Signal::Weak;
        }
    }
    Signal::None
}

/// "X is A" vs "X is B" with the same subject and a different value.
fn value_swap_signal(a: &[String], b: &[String]) -> Signal {
    let split = |words: &[String]| -> Option<(String, String)> {
        let pivot = words.iter().position(|w| PIVOTS.contains(&w.as_str()))?;
        Some((words[..pivot].join(" "), words[pivot + 1..].join(" ")))
    };
    let (Some((subject_a, value_a)), Some((subject_b, value_b))) = (split(a), split(b)) else {
        return Signal::None;
    };

    let subject_overlap = jaccard(&content_words(&subject_a), &content_words(&subject_b));
    if subject_overlap <= 0.7 || value_a.is_empty() || value_b.is_empty() || value_a == value_b {
        return Signal::None;
    }
    if value_a.contains(&value_b)
        || value_b.contains(&value_a)
        || is_word_subset(&value_a, &value_b)
        || is_word_subset(&value_b, &value_a)
    {
        return Signal::None;
    }
    Signal::Weak
}

fn is_word_subset(subset: &str, superset: &str) -> bool {
    let super_words: HashSet<&str> = superset.split_whitespace().collect();
    subset
        .split_whitespace()
        .filter(|w| w.len() > 1)
        .all(|w| super_words.contains(w))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assess(a: &str, b: &str) -> Signal {
        HeuristicNli::new().assess(a, b)
    }

    #[test]
    fn test_negation_is_strong() {
        assert_eq!(
            assess("The vendor met the deadline.", "The vendor did not meet the deadline."),
            Signal::Strong
        );
        assert_eq!(
            assess("The launch isn't on schedule.", "The launch is on schedule."),
            Signal::Strong
        );
    }

    #[test]
    fn test_no_longer_negates() {
        assert_eq!(
            assess("We use the legacy system.", "We no longer use the legacy system."),
            Signal::Strong
        );
    }

    #[test]
    fn test_antonym_swap_is_strong() {
        assert_eq!(
            assess("Quarterly revenue increased.", "Quarterly revenue decreased."),
            Signal::Strong
        );
    }

    #[test]
    fn test_antonyms_in_unrelated_sentences_are_ignored() {
        assert_eq!(
            assess("Revenue increased sharply.", "Office rent decreased."),
            Signal::None
        );
    }

    #[test]
    fn test_value_swap_is_weak() {
        assert_eq!(
            assess("The project lead is Alice.", "The project lead is Bob."),
            Signal::Weak
        );
    }

    #[test]
    fn test_value_extension_is_not_a_contradiction() {
        assert_eq!(
            assess("The project lead is Alice.", "The project lead is Alice Chen."),
            Signal::None
        );
    }

    #[test]
    fn test_unrelated_pair_is_neutral() {
        let prediction =
            HeuristicNli::new().classify("The sky is blue.", "Paris is the capital of France.");
        assert_eq!(prediction.label, NliLabel::Neutral);
    }

    #[test]
    fn test_restatement_is_entailment() {
        let prediction = HeuristicNli::new().classify(
            "The budget was approved in March.",
            "The budget was approved in March!",
        );
        assert_eq!(prediction.label, NliLabel::Entailment);
    }

    #[test]
    fn test_strong_signal_maps_above_default_threshold() {
        let prediction = HeuristicNli::new()
            .classify("Quarterly revenue increased.", "Quarterly revenue decreased.");
        assert_eq!(prediction.label, NliLabel::Contradiction);
        assert!(prediction.score >= 0.5);
    }

    #[test]
    fn test_weak_signal_maps_below_default_threshold() {
        let prediction = HeuristicNli::new()
            .classify("The project lead is Alice.", "The project lead is Bob.");
        assert_eq!(prediction.label, NliLabel::Contradiction);
        assert!(prediction.score < 0.5);
    }

    #[tokio::test]
    async fn test_backend_name() {
        let backend = HeuristicNli::new();
        assert_eq!(backend.name(), "heuristic");
        assert!(backend.predict("A is b.", "A is b.").await.is_ok());
    }
}

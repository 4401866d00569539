//! Numeric fact extraction and the numeric-inconsistency heuristic.
//!
//! Two sentences are numerically inconsistent when they talk about the same
//! thing and each states a value, for a shared unit kind, that the other does
//! not. "About the same thing" means their content words overlap by at least
//! `context_overlap_threshold` (after folding common business synonyms), or
//! they state a quantity in the same unit. Sentences pinned to different
//! periods ("in 2023" vs "in 2024", "Q1" vs "Q2") are never compared.

use std::collections::{BTreeSet, HashSet};
use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Serialize;

use super::utils::{content_words, jaccard};
use crate::config::NumericConfig;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        (?P<prefix>[$€£]\s?|\b(?:usd|eur|gbp|pkr)\s?)?
        \b(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)
        (?P<scale>\s?(?:thousand|million|billion|bn|k)\b)?
        (?P<suffix>
            \s?%
            |\s(?:percent|per\ cent)\b
            |\s?(?:usd|eur|gbp|pkr)\b
            |\s(?:hours?|days?|weeks?|months?|quarters?|years?)\b
        )?",
    )
    .expect("valid number regex")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{1,4}[/-]\d{1,2}[/-]\d{1,4}\b").expect("valid date regex")
});

static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:q[1-4]|h[12]|fy\d{2,4}|(?:19|20)\d{2})$").expect("valid period regex")
});

/// Words folded onto one concept before measuring context overlap.
const CONCEPT_GROUPS: &[&[&str]] = &[
    &["budget", "budgets", "funding", "fund", "funds", "allocation", "allocated"],
    &["cost", "costs", "expense", "expenses", "spending", "spend", "expenditure", "price"],
    &["revenue", "revenues", "sales", "income", "turnover"],
    &["profit", "profits", "gain", "gains"],
    &["loss", "losses", "deficit"],
    &["deadline", "due", "timeline", "schedule", "milestone"],
    &["duration", "length", "period", "span"],
    &["target", "targets", "goal", "goals", "objective", "kpi"],
    &["staff", "employees", "headcount", "workforce", "team"],
];

/// Scale and unit words, which say nothing about the subject of a sentence.
const UNIT_WORDS: &[&str] = &[
    "thousand", "million", "billion", "bn", "percent", "cent", "usd", "eur", "gbp", "pkr",
];

/// Kind of quantity a fact states. Only facts of the same kind are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "unit")]
pub enum UnitKind {
    Percent,
    Currency(&'static str),
    Time(&'static str),
    /// Years and calendar dates, kept as opaque tokens.
    Date,
    Count,
}

impl UnitKind {
    /// Unit string, if the quantity has one.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Percent => Some("%"),
            Self::Currency(code) => Some(code),
            Self::Time(unit) => Some(unit),
            Self::Date => Some("date"),
            Self::Count => None,
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            Self::Percent => "percentage",
            Self::Currency(_) => "amount",
            Self::Time(_) => "duration",
            Self::Date => "date",
            Self::Count => "figure",
        }
    }
}

/// A quantity stated in a sentence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericFact {
    pub value: f64,
    pub kind: UnitKind,
    /// Text as written, e.g. `"$1,200"` or `"20%"`.
    pub raw_span: String,
    /// Written without a decimal part.
    pub integral: bool,
}

impl NumericFact {
    pub fn unit(&self) -> Option<&'static str> {
        self.kind.unit()
    }
}

/// Extract every numeric fact stated in `sentence`, in order of appearance.
pub fn extract_facts(sentence: &str) -> Vec<NumericFact> {
    let mut facts = Vec::new();
    let mut dates: Vec<Range<usize>> = Vec::new();

    for m in DATE_RE.find_iter(sentence) {
        let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
        if let Ok(value) = digits.parse::<f64>() {
            facts.push(NumericFact {
                value,
                kind: UnitKind::Date,
                raw_span: m.as_str().to_string(),
                integral: true,
            });
            dates.push(m.range());
        }
    }

    for caps in NUMBER_RE.captures_iter(sentence) {
        let Some(whole) = caps.get(0) else { continue };
        if dates.iter().any(|d| d.start <= whole.start() && whole.end() <= d.end) {
            continue;
        }
        if let Some(fact) = fact_from_captures(sentence, &caps) {
            facts.push(fact);
        }
    }

    facts
}

fn fact_from_captures(sentence: &str, caps: &Captures<'_>) -> Option<NumericFact> {
    let whole = caps.get(0)?;
    let num = caps.name("num")?;
    let prefix = caps.name("prefix").map(|m| m.as_str().trim().to_lowercase());
    let scale = caps.name("scale").map(|m| m.as_str().trim().to_lowercase());
    let suffix = caps.name("suffix").map(|m| m.as_str().trim().to_lowercase());

    // Digits glued to letters ("3rd", "5G", "COVID-19", "v2.0") are identifiers.
    if scale.is_none() && suffix.is_none() {
        if let Some(next) = sentence[num.end()..].chars().next() {
            if next.is_alphabetic() {
                return None;
            }
        }
    }
    if prefix.is_none() {
        let mut before = sentence[..num.start()].chars().rev();
        if let (Some(joiner), Some(prev)) = (before.next(), before.next()) {
            if matches!(joiner, '-' | '/' | '.') && prev.is_alphanumeric() {
                return None;
            }
        }
    }

    let digits = num.as_str().replace(',', "");
    let mut value: f64 = digits.parse().ok()?;
    let integral = !digits.contains('.');

    if let Some(scale) = scale.as_deref() {
        value *= match scale {
            "thousand" | "k" => 1e3,
            "million" => 1e6,
            _ => 1e9,
        };
    }

    let kind = match (prefix.as_deref(), suffix.as_deref()) {
        (_, Some(s)) if s == "%" || s.starts_with("per") => UnitKind::Percent,
        (Some(p), _) => UnitKind::Currency(currency_code(p)?),
        (None, Some(s)) => match currency_code(s) {
            Some(code) => UnitKind::Currency(code),
            None => UnitKind::Time(time_unit(s)?),
        },
        (None, None) if is_year(&digits) => UnitKind::Date,
        (None, None) => UnitKind::Count,
    };

    Some(NumericFact {
        value,
        kind,
        raw_span: whole.as_str().trim().to_string(),
        integral,
    })
}

fn currency_code(token: &str) -> Option<&'static str> {
    match token {
        "$" | "usd" => Some("USD"),
        "€" | "eur" => Some("EUR"),
        "£" | "gbp" => Some("GBP"),
        "pkr" => Some("PKR"),
        _ => None,
    }
}

fn time_unit(token: &str) -> Option<&'static str> {
    match token.trim_end_matches('s') {
        "hour" => Some("hour"),
        "day" => Some("day"),
        "week" => Some("week"),
        "month" => Some("month"),
        "quarter" => Some("quarter"),
        "year" => Some("year"),
        _ => None,
    }
}

fn is_year(digits: &str) -> bool {
    digits.len() == 4
        && digits
            .parse::<u32>()
            .map(|year| (1900..=2100).contains(&year))
            .unwrap_or(false)
}

fn canonical_word(word: String) -> String {
    CONCEPT_GROUPS
        .iter()
        .find(|group| group.contains(&word.as_str()))
        .map(|group| group[0].to_string())
        .unwrap_or(word)
}

/// Everything the heuristic needs to know about one sentence, computed once per run.
#[derive(Debug, Clone)]
pub struct NumericProfile {
    facts: Vec<NumericFact>,
    words: HashSet<String>,
    periods: BTreeSet<String>,
}

impl NumericProfile {
    pub fn of(sentence: &str) -> Self {
        let facts = extract_facts(sentence);
        let raw_words = content_words(sentence);
        let mut periods: BTreeSet<String> = raw_words
            .iter()
            .filter(|w| PERIOD_RE.is_match(w))
            .cloned()
            .collect();
        periods.extend(
            facts
                .iter()
                .filter(|f| f.kind == UnitKind::Date)
                .map(|f| f.raw_span.to_lowercase()),
        );
        let words = raw_words
            .into_iter()
            .filter(|w| !UNIT_WORDS.contains(&w.as_str()))
            .map(canonical_word)
            .collect();

        Self {
            facts,
            words,
            periods,
        }
    }

    pub fn facts(&self) -> &[NumericFact] {
        &self.facts
    }

    pub fn has_facts(&self) -> bool {
        !self.facts.is_empty()
    }

    fn kinds(&self) -> BTreeSet<UnitKind> {
        self.facts.iter().map(|f| f.kind).collect()
    }

    fn facts_of(&self, kind: UnitKind) -> Vec<&NumericFact> {
        self.facts.iter().filter(|f| f.kind == kind).collect()
    }
}

/// A value disagreement between two sentences.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericMismatch {
    pub kind: UnitKind,
    pub left: Vec<String>,
    pub right: Vec<String>,
}

impl NumericMismatch {
    pub fn verdict(&self) -> String {
        format!(
            "Contradicts on stated {} ({} vs {})",
            self.kind.noun(),
            self.left.join(", "),
            self.right.join(", ")
        )
    }
}

/// Compares numeric profiles using configured tolerances.
#[derive(Debug, Clone)]
pub struct NumericComparator {
    config: NumericConfig,
}

impl NumericComparator {
    pub fn new(config: NumericConfig) -> Self {
        Self { config }
    }

    pub fn compare_text(&self, a: &str, b: &str) -> Option<NumericMismatch> {
        self.compare(&NumericProfile::of(a), &NumericProfile::of(b))
    }

    /// Returns the first disagreeing unit kind, or `None` when the pair is
    /// numerically consistent or not comparable.
    pub fn compare(&self, a: &NumericProfile, b: &NumericProfile) -> Option<NumericMismatch> {
        if !a.has_facts() || !b.has_facts() {
            return None;
        }
        if !a.periods.is_empty() && !b.periods.is_empty() && a.periods.is_disjoint(&b.periods) {
            return None;
        }

        let shared_kinds: Vec<UnitKind> = a
            .kinds()
            .intersection(&b.kinds())
            .copied()
            .filter(|kind| *kind != UnitKind::Date)
            .collect();
        if shared_kinds.is_empty() || !self.same_context(a, b, &shared_kinds) {
            return None;
        }

        shared_kinds.into_iter().find_map(|kind| {
            let left = a.facts_of(kind);
            let right = b.facts_of(kind);
            let left_unmatched = left
                .iter()
                .any(|fa| !right.iter().any(|fb| self.values_match(kind, fa, fb)));
            let right_unmatched = right
                .iter()
                .any(|fb| !left.iter().any(|fa| self.values_match(kind, fa, fb)));

            (left_unmatched && right_unmatched).then(|| NumericMismatch {
                kind,
                left: left.iter().map(|f| f.raw_span.clone()).collect(),
                right: right.iter().map(|f| f.raw_span.clone()).collect(),
            })
        })
    }

    fn same_context(&self, a: &NumericProfile, b: &NumericProfile, shared: &[UnitKind]) -> bool {
        shared.iter().any(|kind| kind.unit().is_some())
            || jaccard(&a.words, &b.words) >= self.config.context_overlap_threshold
    }

    fn values_match(&self, kind: UnitKind, a: &NumericFact, b: &NumericFact) -> bool {
        let diff = (a.value - b.value).abs();
        let exact = match kind {
            UnitKind::Percent => true,
            UnitKind::Currency(_) => false,
            _ => a.integral && b.integral,
        };
        if exact {
            diff <= self.config.integer_tolerance
        } else {
            diff <= self.config.relative_tolerance * a.value.abs().max(b.value.abs())
        }
    }
}

impl Default for NumericComparator {
    fn default() -> Self {
        Self::new(NumericConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn spans(sentence: &str) -> Vec<String> {
        extract_facts(sentence)
            .into_iter()
            .map(|f| f.raw_span)
            .collect()
    }

    #[test]
    fn test_extracts_percentages() {
        let facts = extract_facts("Revenue grew 20% in Q1.");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].kind, UnitKind::Percent);
        assert_eq!(facts[0].value, 20.0);
        assert_eq!(facts[0].raw_span, "20%");
        assert_eq!(facts[0].unit(), Some("%"));
    }

    #[test]
    fn test_word_percent() {
        let facts = extract_facts("Margins improved by 4.5 percent.");
        assert_eq!(facts[0].kind, UnitKind::Percent);
        assert_eq!(facts[0].value, 4.5);
        assert!(!facts[0].integral);
    }

    #[test]
    fn test_extracts_currency_forms() {
        let facts = extract_facts("We spent $1,200 and €3.5 million, plus PKR 500 and 40 USD.");
        let kinds: Vec<UnitKind> = facts.iter().map(|f| f.kind).collect();
        assert_eq!(
            kinds,
            vec![
                UnitKind::Currency("USD"),
                UnitKind::Currency("EUR"),
                UnitKind::Currency("PKR"),
                UnitKind::Currency("USD"),
            ]
        );
        assert_eq!(facts[0].value, 1200.0);
        assert_eq!(facts[1].value, 3_500_000.0);
    }

    #[test]
    fn test_extracts_durations() {
        let facts = extract_facts("The rollout takes 6 months and 2 quarters of testing.");
        assert_eq!(facts[0].kind, UnitKind::Time("month"));
        assert_eq!(facts[1].kind, UnitKind::Time("quarter"));
    }

    #[test]
    fn test_identifiers_are_not_facts() {
        assert!(extract_facts("Revenue grew in Q1 despite COVID-19 and 5G rollouts.").is_empty());
        assert!(extract_facts("She finished 3rd.").is_empty());
    }

    #[test]
    fn test_years_and_dates_are_opaque() {
        let facts = extract_facts("Signed on 12/05/2024 and renewed in 2025.");
        assert_eq!(spans("Signed on 12/05/2024 and renewed in 2025."), vec!["12/05/2024", "2025"]);
        assert!(facts.iter().all(|f| f.kind == UnitKind::Date));
    }

    #[test]
    fn test_plain_counts() {
        let facts = extract_facts("The team has 12 engineers.");
        assert_eq!(facts[0].kind, UnitKind::Count);
        assert_eq!(facts[0].unit(), None);
    }

    #[test]
    fn test_percentage_mismatch_detected() {
        let mismatch = NumericComparator::default()
            .compare_text("Revenue grew 20% in Q1.", "Revenue grew 5% in Q1.")
            .expect("mismatch");
        assert_eq!(mismatch.kind, UnitKind::Percent);
        assert_eq!(
            mismatch.verdict(),
            "Contradicts on stated percentage (20% vs 5%)"
        );
    }

    #[test]
    fn test_same_value_is_consistent() {
        let comparator = NumericComparator::default();
        assert!(comparator
            .compare_text("Revenue grew 20% in Q1.", "In Q1 revenue grew 20%.")
            .is_none());
    }

    #[test]
    fn test_currency_within_relative_tolerance() {
        let comparator = NumericComparator::default();
        assert!(comparator
            .compare_text("The budget is $10,000.", "The budget is $10,050.")
            .is_none());
        assert!(comparator
            .compare_text("The budget is $10,000.", "The budget is $12,000.")
            .is_some());
    }

    #[test]
    fn test_synonyms_share_context() {
        let mismatch = NumericComparator::default().compare_text(
            "The project budget is $50,000.",
            "Project funding was set at $75,000.",
        );
        assert!(mismatch.is_some());
    }

    #[test]
    fn test_unrelated_counts_not_compared() {
        let comparator = NumericComparator::default();
        assert!(comparator
            .compare_text("The team has 12 engineers.", "The office holds 40 desks.")
            .is_none());
    }

    #[test]
    fn test_shared_unit_is_enough_context() {
        let mismatch = NumericComparator::default()
            .compare_text("Completion takes 6 months.", "We need 9 months.")
            .expect("mismatch");
        assert_eq!(
            mismatch.verdict(),
            "Contradicts on stated duration (6 months vs 9 months)"
        );
    }

    #[test]
    fn test_different_periods_not_compared() {
        let comparator = NumericComparator::default();
        assert!(comparator
            .compare_text("Revenue grew 20% in 2023.", "Revenue grew 5% in 2024.")
            .is_none());
        assert!(comparator
            .compare_text("Revenue grew 20% in Q1.", "Revenue grew 5% in Q2.")
            .is_none());
    }

    #[test]
    fn test_superset_is_not_a_mismatch() {
        let comparator = NumericComparator::default();
        assert!(comparator
            .compare_text(
                "Revenue grew 20% in Q1.",
                "Revenue grew 20% in Q1 while costs grew 5%."
            )
            .is_none());
    }

    #[test]
    fn test_requires_numbers_on_both_sides() {
        let comparator = NumericComparator::default();
        assert!(comparator
            .compare_text("Revenue grew 20% in Q1.", "Revenue grew strongly in Q1.")
            .is_none());
    }

    #[test]
    fn test_integer_tolerance_is_configurable() {
        let comparator = NumericComparator::new(NumericConfig {
            integer_tolerance: 1.0,
            ..NumericConfig::default()
        });
        assert!(comparator
            .compare_text("The team has 12 engineers.", "The team has 13 engineers.")
            .is_none());
    }
}

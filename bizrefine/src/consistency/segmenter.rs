//! Sentence segmentation.
//!
//! Boundaries come from the Unicode sentence rules (UAX #29), which keep
//! decimals ("3.5") and lowercase continuations ("e.g. the") together. A second
//! pass re-joins splits that land after an abbreviation when the next piece
//! continues the sentence: anything after a title ("Dr. Smith"), a number or
//! lowercase word after a short form ("No. 5", "Jan. 15"), and chains of
//! initials ("J. R. Tolkien"). A capitalised word after "Dec." or "option B."
//! starts a new sentence. Ellipses can still split a sentence early; callers
//! get a best-effort segmentation, never an error.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

use super::types::Sentence;

/// Titles and Latin short forms that do not end a sentence.
const TITLES: &[&str] = &[
    "mr.", "mrs.", "ms.", "dr.", "prof.", "sr.", "jr.", "st.", "mt.", "gen.", "gov.", "rep.",
    "sen.", "vs.", "e.g.", "i.e.", "cf.",
];

/// Short forms that may end a sentence; only a lowercase or numeric
/// continuation is joined to them.
const ABBREVIATIONS: &[&str] = &[
    "approx.", "inc.", "ltd.", "co.", "corp.", "dept.", "no.", "nos.", "fig.", "vol.", "est.",
    "etc.", "jan.", "feb.", "mar.", "apr.", "jun.", "jul.", "aug.", "sep.", "sept.", "oct.",
    "nov.", "dec.",
];

/// Split `text` into trimmed, non-empty sentences in document order.
///
/// Empty or whitespace-only input yields an empty vector.
pub fn segment(text: &str) -> Vec<Sentence> {
    let mut spans: Vec<Range<usize>> = Vec::new();

    for (start, piece) in text.split_sentence_bound_indices() {
        let Some(range) = trimmed_range(start, piece) else {
            continue;
        };

        if let Some(last) = spans.last_mut() {
            let gap = &text[last.end..range.start];
            if !is_paragraph_break(gap) && continues(&text[last.clone()], &text[range.clone()]) {
                last.end = range.end;
                continue;
            }
        }

        spans.push(range);
    }

    spans
        .into_iter()
        .enumerate()
        .map(|(index, position)| Sentence {
            index,
            text: text[position.clone()].to_string(),
            position,
        })
        .collect()
}

fn trimmed_range(start: usize, piece: &str) -> Option<Range<usize>> {
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return None;
    }
    let leading = piece.len() - piece.trim_start().len();
    let begin = start + leading;
    Some(begin..begin + trimmed.len())
}

fn is_paragraph_break(gap: &str) -> bool {
    gap.matches('\n').count() >= 2
}

/// Whether `next` carries on the sentence that `previous` split off at an
/// abbreviation.
fn continues(previous: &str, next: &str) -> bool {
    let words: Vec<&str> = previous.split_whitespace().map(strip_opening).collect();
    let Some(&last) = words.last() else {
        return false;
    };
    let Some(first) = next.chars().next() else {
        return false;
    };
    let lowered = last.to_lowercase();

    if TITLES.contains(&lowered.as_str()) {
        return true;
    }

    let lower_or_digit = first.is_lowercase() || first.is_ascii_digit();
    if ABBREVIATIONS.contains(&lowered.as_str()) {
        return lower_or_digit;
    }
    if !is_initial(last) {
        return false;
    }
    if lower_or_digit {
        return true;
    }

    // "J. R. Tolkien" and "Dr. J. Smith" but not "option B. The".
    let before = words.len().checked_sub(2).map(|k| words[k]);
    let named = match before {
        None => true,
        Some(word) => is_initial(word) || TITLES.contains(&word.to_lowercase().as_str()),
    };
    named
        || next
            .split_whitespace()
            .next()
            .map(strip_opening)
            .is_some_and(is_initial)
}

fn strip_opening(word: &str) -> &str {
    word.trim_start_matches(|c: char| matches!(c, '(' | '[' | '"' | '\'' | '“'))
}

/// A single capital letter followed by a period.
fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.'), None) if c.is_uppercase()
    )
}

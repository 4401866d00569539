//! Prompt templates for the generative capability.
//!
//! Plain `format!()` interpolation; a missing variable is a compile error.

use crate::consistency::ComparisonResult;

/// System prompt for the corrective rewrite.
pub fn conflict_fix_system_prompt() -> &'static str {
    "You are an expert document editor. Your task is to rewrite a piece of text to resolve a \
     specific list of detected contradictions. Produce a single, clean, professionally written \
     block of text that is logically consistent. Do not comment on the errors; fix them. \
     Return only the corrected text, without headings, quotes or explanations."
}

/// Prompt asking for one corrected draft of `text` that resolves `issues`.
///
/// # Example
/// ```
/// use bizrefine::llm::prompts::conflict_fix_prompt;
///
/// let prompt = conflict_fix_prompt("Revenue grew 20%. Revenue grew 5%.", &[]);
/// assert!(prompt.contains("Revenue grew 20%"));
/// ```
pub fn conflict_fix_prompt(text: &str, issues: &[&ComparisonResult]) -> String {
    let issue_list = if issues.is_empty() {
        "(none listed)".to_string()
    } else {
        issues
            .iter()
            .enumerate()
            .map(|(n, issue)| {
                format!(
                    "{}. {}\n   Sentence {}: \"{}\"\n   Sentence {}: \"{}\"",
                    n + 1,
                    issue.verdict,
                    issue.i + 1,
                    issue.sentence1,
                    issue.j + 1,
                    issue.sentence2
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"Rewrite the following text to resolve all of the inconsistencies listed below.
Keep every statement that is not involved in a conflict. Where two statements disagree,
keep the one that is best supported by the rest of the text.

--- ORIGINAL TEXT ---
{text}

--- DETECTED INCONSISTENCIES ---
{issue_list}

--- CORRECTED, PROFESSIONAL VERSION ---
"#
    )
}

/// System prompt for the three-way section rewrite.
pub fn section_rewrite_system_prompt() -> &'static str {
    "You are an expert editor. The user will provide text. Generate three distinct rewrites: \
     1. professional: formal, corporate and polished. \
     2. concise: as short as possible while keeping the core meaning. \
     3. simpler: easy to understand, avoids jargon. \
     Respond only with a JSON object."
}

/// Prompt for the three rewrite variants of `text`.
pub fn section_rewrite_prompt(text: &str) -> String {
    format!(
        r#"Original text to rewrite:

"{text}"

Return a JSON object with exactly these string fields:
{{"original": "<the original text>", "professional": "...", "concise": "...", "simpler": "..."}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consistency::NliLabel;

    fn issue() -> ComparisonResult {
        ComparisonResult {
            i: 0,
            j: 1,
            sentence1: "Revenue grew 20% in Q1.".to_string(),
            sentence2: "Revenue grew 5% in Q1.".to_string(),
            label: NliLabel::Contradiction,
            score: 0.7,
            numeric_flag: true,
            truncated: false,
            verdict: "Contradicts on stated percentage (20% vs 5%)".to_string(),
        }
    }

    #[test]
    fn test_conflict_fix_prompt_lists_issues() {
        let issue = issue();
        let prompt = conflict_fix_prompt("Revenue grew 20% in Q1. Revenue grew 5% in Q1.", &[&issue]);
        assert!(prompt.contains("1. Contradicts on stated percentage (20% vs 5%)"));
        assert!(prompt.contains("Sentence 2: \"Revenue grew 5% in Q1.\""));
        assert!(prompt.contains("--- ORIGINAL TEXT ---"));
    }

    #[test]
    fn test_section_rewrite_prompt_requests_json() {
        let prompt = section_rewrite_prompt("We leverage synergies.");
        assert!(prompt.contains("\"We leverage synergies.\""));
        assert!(prompt.contains("\"professional\""));
        assert!(section_rewrite_system_prompt().contains("JSON"));
    }
}

//! Citation style detection and conversion.
//!
//! Detection is a cascade of surface patterns, checked academic styles
//! first. Conversion pulls author, year, title, source and URL out of the
//! input with loose patterns and renders the target template; anything it
//! cannot find gets a placeholder.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! static_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect("valid citation regex"));
    };
}

static_regex!(PAREN_YEAR_RE, r"\(\d{4}\)");
static_regex!(BRACKET_NUMBER_RE, r"\[\d+\]");
static_regex!(LEADING_NUMBER_RE, r"^\d+\.");
static_regex!(TRAILING_YEAR_RE, r"\d{4}\)$");
static_regex!(SUPERSCRIPT_RE, r"[¹²³]");
static_regex!(URL_RE, r"https?://\S+");
static_regex!(STANDARD_RE, r"(?i)\b(?:iso|iec|ieee)\b");
static_regex!(INTERNAL_REF_RE, r"(?i)\bref\.");
static_regex!(ACCORDING_TO_RE, r"According to ([A-Za-z& ]+)");
static_regex!(YEAR_RE, r"\(?(\d{4})\)?");
static_regex!(TITLE_RE, r#"["“]([^"“”]+)["”]"#);
static_regex!(SOURCE_RE, r"\b([A-Z][A-Za-z0-9&\- ]+)\b");
static_regex!(AUTHOR_SPLIT_RE, r"[,.(]");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CitationStyle {
    Apa,
    Ieee,
    Vancouver,
    Mla,
    Harvard,
    Chicago,
    Inline,
    Footnote,
    Hyperlink,
    Iso,
    Internal,
    Unknown,
}

impl CitationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apa => "apa",
            Self::Ieee => "ieee",
            Self::Vancouver => "vancouver",
            Self::Mla => "mla",
            Self::Harvard => "harvard",
            Self::Chicago => "chicago",
            Self::Inline => "inline",
            Self::Footnote => "footnote",
            Self::Hyperlink => "hyperlink",
            Self::Iso => "iso",
            Self::Internal => "internal",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for CitationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CitationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "apa" => Ok(Self::Apa),
            "ieee" => Ok(Self::Ieee),
            "vancouver" => Ok(Self::Vancouver),
            "mla" => Ok(Self::Mla),
            "harvard" => Ok(Self::Harvard),
            "chicago" => Ok(Self::Chicago),
            "inline" => Ok(Self::Inline),
            "footnote" => Ok(Self::Footnote),
            "hyperlink" => Ok(Self::Hyperlink),
            "iso" => Ok(Self::Iso),
            "internal" => Ok(Self::Internal),
            other => Err(format!("unknown citation style '{other}'")),
        }
    }
}

/// Guess the style of a single citation.
pub fn detect_style(text: &str) -> CitationStyle {
    let t = text.trim();
    let before_first_paren = t.split(')').next().unwrap_or_default();

    if PAREN_YEAR_RE.is_match(t) && before_first_paren.contains('.') {
        return CitationStyle::Apa;
    }
    if BRACKET_NUMBER_RE.is_match(t) {
        return CitationStyle::Ieee;
    }
    if LEADING_NUMBER_RE.is_match(t) {
        return CitationStyle::Vancouver;
    }
    if t.contains("et al.") && t.contains('"') {
        return CitationStyle::Mla;
    }
    if PAREN_YEAR_RE.is_match(t) && t.matches(',').count() >= 2 {
        return CitationStyle::Harvard;
    }
    if TRAILING_YEAR_RE.is_match(t) && t.contains('"') {
        return CitationStyle::Chicago;
    }

    if t.to_lowercase().starts_with("according to") {
        return CitationStyle::Inline;
    }
    if SUPERSCRIPT_RE.is_match(t) {
        return CitationStyle::Footnote;
    }
    if URL_RE.is_match(t) {
        return CitationStyle::Hyperlink;
    }
    if STANDARD_RE.is_match(t) {
        return CitationStyle::Iso;
    }
    if INTERNAL_REF_RE.is_match(t) {
        return CitationStyle::Internal;
    }

    CitationStyle::Unknown
}

/// Parts of a citation, with placeholders for what could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationParts {
    pub author: String,
    pub year: String,
    pub title: String,
    pub source: String,
    pub url: Option<String>,
}

impl CitationParts {
    pub fn extract(text: &str) -> Self {
        let author = ACCORDING_TO_RE
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| {
                AUTHOR_SPLIT_RE
                    .split(text)
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            });

        let year = YEAR_RE.captures(text).map(|c| c[1].to_string());

        let title = TITLE_RE
            .captures(text)
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| "Untitled".to_string());

        let source = year
            .as_deref()
            .and_then(|y| text.rsplit(y).next())
            .and_then(|after_year| SOURCE_RE.captures(after_year))
            .map(|c| c[1].trim().to_string())
            .unwrap_or_else(|| "Unknown Source".to_string());

        let url = URL_RE.find(text).map(|m| m.as_str().to_string());

        Self {
            author,
            year: year.unwrap_or_else(|| "n.d.".to_string()),
            title,
            source,
            url,
        }
    }
}

/// Render `text` in `style`. An unrecognised target style returns the text unchanged.
pub fn format(style: &str, text: &str) -> String {
    match style.parse::<CitationStyle>() {
        Ok(style) => format_as(style, text),
        Err(_) => text.to_string(),
    }
}

pub fn format_as(style: CitationStyle, text: &str) -> String {
    let CitationParts {
        author,
        year,
        title,
        source,
        url,
    } = CitationParts::extract(text);

    match style {
        CitationStyle::Apa => format!("{author} ({year}). {title}. {source}."),
        CitationStyle::Ieee => format!("{author}, \"{title},\" {source}, {year}."),
        CitationStyle::Mla => format!("{author}. \"{title}.\" {source}, {year}."),
        CitationStyle::Chicago => format!("{author}. \"{title}.\" {source} ({year})."),
        CitationStyle::Harvard => format!("{author} ({year}) {title}. {source}."),
        CitationStyle::Inline => format!("According to {author} ({year}), {title}."),
        CitationStyle::Footnote => format!("¹ {author} ({year}), {title}, {source}."),
        CitationStyle::Hyperlink => match url {
            Some(url) => format!("{title} — [Source]({url}) ({year})"),
            None => format!("{title} ({year})"),
        },
        CitationStyle::Iso => format!("ISO/IEC {source}: {title} ({year})."),
        CitationStyle::Internal => format!("Ref. No. {source} — {title} ({year})"),
        CitationStyle::Vancouver | CitationStyle::Unknown => text.to_string(),
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};
use tokio::sync::RwLock;

use crate::error::{RefineError, Result};

static ACRONYM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,}\b").expect("valid acronym regex"));
static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z]{2,}\b").expect("valid word regex"));

/// Acronym dictionary backed by a JSON file of `{"acronym": "meaning"}`
/// pairs, both lowercase.
#[derive(Clone, Debug)]
pub struct AcronymStore {
    path: PathBuf,
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

/// Result of expanding the acronyms in a passage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub text: String,
    /// Acronyms with no dictionary entry, sorted and de-duplicated.
    pub unknown: Vec<String>,
}

impl AcronymStore {
    /// Load the dictionary, creating an empty file if none exists yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                normalise(serde_json::from_str::<BTreeMap<String, String>>(&raw)?)
            }
        } else {
            tracing::info!(path = %path.display(), "No acronym file found, creating an empty one");
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, "{}")?;
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Acronym dictionary loaded");
        Ok(Self {
            path,
            entries: Arc::new(RwLock::new(entries)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Replace every known acronym with `Title Case Meaning (ACR)`.
    ///
    /// Detection looks for runs of two or more capitals. Once an acronym is
    /// detected, its other spellings in the text ("kpi", "Kpi") are expanded
    /// too.
    pub async fn expand(&self, text: &str) -> Expansion {
        let entries = self.entries.read().await;

        let detected: BTreeSet<String> = ACRONYM_RE
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        let unknown: Vec<String> = detected
            .iter()
            .filter(|acr| !entries.contains_key(&acr.to_lowercase()))
            .cloned()
            .collect();
        let known: BTreeSet<String> = detected
            .iter()
            .map(|acr| acr.to_lowercase())
            .filter(|key| entries.contains_key(key))
            .collect();

        let expanded = if known.is_empty() {
            text.to_string()
        } else {
            WORD_RE
                .replace_all(text, |caps: &Captures<'_>| {
                    let word = &caps[0];
                    let key = word.to_lowercase();
                    match entries.get(&key) {
                        Some(meaning) if known.contains(&key) => {
                            format!("{} ({})", title_case(meaning), word.to_uppercase())
                        }
                        _ => word.to_string(),
                    }
                })
                .into_owned()
        };

        Expansion {
            text: expanded,
            unknown,
        }
    }

    /// Add a definition if the acronym is new. Returns whether it was added.
    pub async fn add(&self, acronym: &str, meaning: &str) -> Result<bool> {
        let key = acronym.trim().to_lowercase();
        let meaning = meaning.trim().to_lowercase();
        if key.is_empty() || meaning.is_empty() {
            return Err(RefineError::Validation(
                "Both acronym and meaning are required".to_string(),
            ));
        }
        if !key.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(RefineError::Validation(format!(
                "'{}' is not a valid acronym",
                acronym.trim()
            )));
        }

        let mut entries = self.entries.write().await;
        if entries.contains_key(&key) {
            tracing::info!(acronym = %key.to_uppercase(), "Acronym already defined");
            return Ok(false);
        }

        entries.insert(key.clone(), meaning);
        let json = serde_json::to_string_pretty(&*entries)?;
        if let Err(e) = tokio::fs::write(&self.path, json).await {
            entries.remove(&key);
            return Err(e.into());
        }

        tracing::info!(acronym = %key.to_uppercase(), "Acronym added");
        Ok(true)
    }
}

fn normalise(entries: BTreeMap<String, String>) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v.to_lowercase()))
        .collect()
}

/// Capitalise the first letter of every alphabetic run.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

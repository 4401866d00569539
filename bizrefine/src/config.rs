use serde::Deserialize;
use std::env;
use std::str::FromStr;

fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub classifier: ClassifierConfig,
    pub consistency: ConsistencyConfig,
    pub rewrite: RewriteConfig,
    pub llm: Option<LlmConfig>,
    pub acronyms: AcronymConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which NLI capability backs the classifier adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackendKind {
    /// Hosted text-classification endpoint (Hugging Face inference API shape).
    Remote,
    /// Offline pattern-based detector.
    Heuristic,
}

impl FromStr for ClassifierBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "remote" | "http" | "huggingface" => Ok(Self::Remote),
            "heuristic" | "local" => Ok(Self::Heuristic),
            other => Err(format!("unknown classifier backend '{other}'")),
        }
    }
}

impl std::fmt::Display for ClassifierBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote => write!(f, "remote"),
            Self::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// NLI classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub backend: ClassifierBackendKind,
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Per-sentence limit; longer sentences are cut from the end.
    pub max_input_chars: usize,
    /// Number of calls allowed into the backend at once.
    pub max_concurrency: usize,
    /// Prediction cache entries, 0 disables the cache.
    pub cache_size: usize,
}

/// Pairing bounds and merge thresholds for the consistency scan
#[derive(Debug, Clone, Deserialize)]
pub struct ConsistencyConfig {
    pub confidence_threshold: f32,
    /// Documents with at most this many sentences get an all-pairs scan.
    pub full_scan_limit: usize,
    /// Above `full_scan_limit`, each sentence is compared with this many predecessors.
    pub window_size: usize,
    pub workers: usize,
    pub numeric: NumericConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumericConfig {
    /// Tolerance for currency amounts and decimals, relative to the larger value.
    pub relative_tolerance: f64,
    /// Absolute tolerance for integers and percentages.
    pub integer_tolerance: f64,
    /// Minimum content-word overlap for two sentences to be about the same fact.
    pub context_overlap_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewriteConfig {
    pub timeout_secs: u64,
}

/// LLM configuration for chat/completion models
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcronymConfig {
    pub path: String,
}

pub const DEFAULT_NLI_MODEL: &str = "typeform/distilbert-base-uncased-mnli";
pub const DEFAULT_NLI_BASE_URL: &str = "https://api-inference.huggingface.co/models";

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackendKind::Heuristic,
            model: DEFAULT_NLI_MODEL.to_string(),
            base_url: DEFAULT_NLI_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 5,
            max_input_chars: 512,
            max_concurrency: 1,
            cache_size: 2048,
        }
    }
}

impl Default for NumericConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: 0.01,
            integer_tolerance: 0.0,
            context_overlap_threshold: 0.3,
        }
    }
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            full_scan_limit: 60,
            window_size: 10,
            workers: 4,
            numeric: NumericConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let nli_api_key = env::var("NLI_API_KEY").ok();
        let nli_base_url = env::var("NLI_BASE_URL").ok();
        let default_backend = if nli_api_key.is_some() || nli_base_url.is_some() {
            ClassifierBackendKind::Remote
        } else {
            ClassifierBackendKind::Heuristic
        };

        Self {
            server: ServerConfig {
                host: env::var("BIZREFINE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: parse_env_or("BIZREFINE_PORT", 5001),
            },
            classifier: ClassifierConfig {
                backend: parse_env_or("NLI_BACKEND", default_backend),
                model: env::var("NLI_MODEL").unwrap_or_else(|_| DEFAULT_NLI_MODEL.to_string()),
                base_url: nli_base_url.unwrap_or_else(|| DEFAULT_NLI_BASE_URL.to_string()),
                api_key: nli_api_key,
                timeout_secs: parse_env_or("NLI_TIMEOUT", 5),
                max_input_chars: parse_env_or("NLI_MAX_INPUT_CHARS", 512),
                max_concurrency: parse_env_or("NLI_MAX_CONCURRENCY", 1),
                cache_size: parse_env_or("NLI_CACHE_SIZE", 2048),
            },
            consistency: ConsistencyConfig {
                confidence_threshold: parse_env_or("CONSISTENCY_CONFIDENCE_THRESHOLD", 0.5),
                full_scan_limit: parse_env_or("CONSISTENCY_FULL_SCAN_LIMIT", 60),
                window_size: parse_env_or("CONSISTENCY_WINDOW_SIZE", 10),
                workers: parse_env_or("CONSISTENCY_WORKERS", 4),
                numeric: NumericConfig {
                    relative_tolerance: parse_env_or("NUMERIC_RELATIVE_TOLERANCE", 0.01),
                    integer_tolerance: parse_env_or("NUMERIC_INTEGER_TOLERANCE", 0.0),
                    context_overlap_threshold: parse_env_or("NUMERIC_CONTEXT_THRESHOLD", 0.3),
                },
            },
            rewrite: RewriteConfig {
                timeout_secs: parse_env_or("REWRITE_TIMEOUT", 30),
            },
            llm: env::var("LLM_MODEL").ok().map(|model| LlmConfig {
                model,
                api_key: env::var("LLM_API_KEY").ok(),
                base_url: env::var("LLM_BASE_URL").ok(),
                timeout_secs: parse_env_or("LLM_TIMEOUT", 30),
                max_retries: parse_env_or("LLM_MAX_RETRIES", 2),
            }),
            acronyms: AcronymConfig {
                path: env::var("ACRONYM_FILE")
                    .unwrap_or_else(|_| "abbreviations_local.json".to_string()),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Known LLM providers that use OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio", "gemini"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    // Default to treating the whole string as a local model
    ("local", model)
}

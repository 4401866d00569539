use axum::{http::StatusCode, response::IntoResponse};
use serial_test::serial;
use std::env;

use bizrefine::config::{parse_llm_provider_model, Config, KNOWN_LLM_PROVIDERS};
use bizrefine::error::RefineError;

const LLM_VARS: [&str; 5] = [
    "LLM_MODEL",
    "LLM_API_KEY",
    "LLM_BASE_URL",
    "LLM_TIMEOUT",
    "LLM_MAX_RETRIES",
];

fn clear_llm_env() {
    for var in LLM_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_llm_config_gemini() {
    let (provider, model) = parse_llm_provider_model("gemini/gemini-2.5-flash");
    assert_eq!(provider, "gemini");
    assert_eq!(model, "gemini-2.5-flash");
}

#[test]
fn test_llm_config_openrouter() {
    let (provider, model) = parse_llm_provider_model("openrouter/anthropic/claude-3.5-sonnet");
    assert_eq!(provider, "openrouter");
    assert_eq!(model, "anthropic/claude-3.5-sonnet");
}

#[test]
fn test_llm_config_provider_prefix_is_case_insensitive() {
    let (provider, model) = parse_llm_provider_model("OpenAI/gpt-4o-mini");
    assert_eq!(provider, "OpenAI");
    assert_eq!(model, "gpt-4o-mini");
}

#[test]
fn test_llm_config_unknown_prefix_defaults_to_local() {
    let (provider, model) = parse_llm_provider_model("unknown/model-name");
    assert_eq!(provider, "local");
    assert_eq!(model, "unknown/model-name");
}

#[test]
fn test_known_llm_providers_constant() {
    for provider in ["openai", "openrouter", "ollama", "lmstudio", "gemini"] {
        assert!(KNOWN_LLM_PROVIDERS.contains(&provider), "missing {provider}");
    }
    assert_eq!(KNOWN_LLM_PROVIDERS.len(), 5);
}

#[test]
#[serial]
fn test_llm_config_none_when_no_env() {
    clear_llm_env();

    let config = Config::default();

    assert!(
        config.llm.is_none(),
        "LlmConfig should be None when LLM_MODEL is not set"
    );
}

#[test]
#[serial]
fn test_llm_config_with_all_env_vars() {
    clear_llm_env();
    env::set_var("LLM_MODEL", "openrouter/anthropic/claude-3.5-sonnet");
    env::set_var("LLM_API_KEY", "sk-test-key");
    env::set_var("LLM_BASE_URL", "https://api.custom.com/v1");
    env::set_var("LLM_TIMEOUT", "60");
    env::set_var("LLM_MAX_RETRIES", "5");

    let config = Config::default();

    let llm = config.llm.expect("LlmConfig should exist");
    assert_eq!(llm.model, "openrouter/anthropic/claude-3.5-sonnet");
    assert_eq!(llm.api_key, Some("sk-test-key".to_string()));
    assert_eq!(llm.base_url, Some("https://api.custom.com/v1".to_string()));
    assert_eq!(llm.timeout_secs, 60);
    assert_eq!(llm.max_retries, 5);

    clear_llm_env();
}

#[test]
#[serial]
fn test_rewrite_timeout_from_env() {
    env::set_var("REWRITE_TIMEOUT", "12");
    assert_eq!(Config::default().rewrite.timeout_secs, 12);

    env::set_var("REWRITE_TIMEOUT", "soon");
    assert_eq!(Config::default().rewrite.timeout_secs, 30);

    env::remove_var("REWRITE_TIMEOUT");
}

#[test]
fn test_llm_error_status_code_mapping() {
    let response = RefineError::Llm("Test error".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[test]
fn test_llm_unavailable_error_status_code_mapping() {
    let response = RefineError::LlmUnavailable("Service down".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[test]
fn test_llm_rate_limit_error_status_code_mapping() {
    let response = RefineError::LlmRateLimit {
        retry_after: Some(60),
    }
    .into_response();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[test]
fn test_classifier_timeout_status_code_mapping() {
    let response = RefineError::ClassifierTimeout { timeout_ms: 5000 }.into_response();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
}

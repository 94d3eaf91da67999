//! LLM provider implementations for RustedMind.
//!
//! All providers implement the `rustedmind_core::Provider` trait.
//! [`build_from_config`] selects and constructs the configured backend.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use rustedmind_config::AppConfig;
use rustedmind_core::error::ProviderError;
use rustedmind_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// Every supported backend speaks the OpenAI chat-completions protocol;
/// they differ only in base URL and whether a key is required.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = config.provider.as_str();
    let base_url = match (&config.api_url, default_base_url(name)) {
        (Some(url), _) => url.clone(),
        (None, Some(url)) => url.to_string(),
        (None, None) => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider '{name}' and no api_url set"
            )));
        }
    };

    let api_key = match (&config.api_key, name) {
        (Some(key), _) => key.clone(),
        (None, "ollama") => "ollama".into(),
        (None, _) => {
            return Err(ProviderError::NotConfigured(format!(
                "provider '{name}' needs an API key"
            )));
        }
    };

    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)?))
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<&'static str> {
    match provider_name {
        "openai" => Some("https://api.openai.com/v1"),
        "openrouter" => Some("https://openrouter.ai/api/v1"),
        "ollama" => Some("http://localhost:11434/v1"),
        _ => None,
    }
}

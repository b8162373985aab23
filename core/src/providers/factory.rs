use crate::config::Config;
use crate::error::{ChatError, Result};
use crate::providers::GeminiProvider;
use crate::traits::Provider;
use std::time::Duration;

pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Builds the Gemini provider. The credential is resolved here, once, so a
/// missing key surfaces before any request is attempted.
pub fn create_provider(config: &Config) -> Result<Box<dyn Provider>> {
    let api_key = resolve_api_key_with_fallback(API_KEY_ENV_VARS, &config.api_key, |name| {
        std::env::var(name).ok()
    })?;

    let mut provider = GeminiProvider::new(api_key)?
        .with_timeout(Duration::from_secs(config.request_timeout_secs))?;
    if let Some(base_url) = &config.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Ok(Box::new(provider))
}

fn resolve_api_key_with_fallback(
    env_vars: &[&str],
    config_key: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String> {
    for var_name in env_vars {
        if let Some(key) = lookup(var_name).filter(|k| !k.trim().is_empty()) {
            tracing::debug!("Using API key from {}", var_name);
            return Ok(key);
        }
    }
    if !config_key.trim().is_empty() {
        Ok(config_key.to_string())
    } else {
        Err(ChatError::Authentication(format!(
            "No API key found. Set one of {} or run `geminal onboard`.",
            env_vars.join(", ")
        )))
    }
}

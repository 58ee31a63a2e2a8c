//! LLM plumbing shared by hosted extraction and the cleanup pass: provider
//! resolution, completion options, and the rate-limit retry loop.
//!
//! ## Retry Strategy
//!
//! Free-tier quotas answer bursts with HTTP 429 / `RESOURCE_EXHAUSTED` and
//! recover on a scale of tens of seconds, so the wait grows linearly
//! (`base × attempt`: 30 s, 60 s, 90 s, 120 s with the defaults). Any other
//! error is not going to go away by waiting and surfaces immediately.

use crate::config::{PipelineConfig, RetryPolicy};
use crate::error::CorpusError;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Value shipped in `.env.example`; treated the same as an unset key.
const PLACEHOLDER_KEY: &str = "your-key-here";

/// Whether an error message describes a rate-limit / quota rejection.
pub fn is_rate_limited(message: &str) -> bool {
    let lower = message.to_lowercase();
    message.contains("429")
        || message.contains("RESOURCE_EXHAUSTED")
        || lower.contains("rate limit")
        || lower.contains("rate_limit")
}

/// Run `op` until it succeeds, retrying only rate-limit failures.
///
/// `label` names the request in log lines ("chunk 2/3 of 'Doing a Job'").
pub async fn with_backoff<T, E, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<T, CorpusError>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let message = e.to_string();
                if !is_rate_limited(&message) {
                    return Err(CorpusError::LlmApiError { message });
                }
                if attempt >= policy.max_attempts {
                    return Err(CorpusError::RateLimitExceeded {
                        attempts: attempt,
                        detail: message,
                    });
                }
                let wait = policy.delay_after(attempt);
                warn!(
                    "{}: rate limited, waiting {}s (attempt {}/{})",
                    label,
                    wait.as_secs(),
                    attempt,
                    policy.max_attempts
                );
                sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Build `CompletionOptions` from the pipeline config.
pub fn build_options(config: &PipelineConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// Send `messages` with retry and return the response text.
pub async fn complete(
    provider: &Arc<dyn LLMProvider>,
    messages: &[ChatMessage],
    config: &PipelineConfig,
    label: &str,
) -> Result<String, CorpusError> {
    let options = &build_options(config);
    let start = Instant::now();
    let response = with_backoff(&config.retry, label, move || {
        provider.chat(messages, Some(options))
    })
    .await?;
    debug!(
        "{}: {} input tokens, {} output tokens, {:?}",
        label,
        response.prompt_tokens,
        response.completion_tokens,
        start.elapsed()
    );
    Ok(response.content)
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, CorpusError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        CorpusError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Reject an empty or placeholder API key.
fn check_api_key(var: &str, value: &str) -> Result<(), CorpusError> {
    let value = value.trim();
    if value.is_empty() || value == PLACEHOLDER_KEY {
        return Err(CorpusError::ProviderNotConfigured {
            provider: "gemini".to_string(),
            hint: format!("Set {var} in the environment or in .env at the site root."),
        });
    }
    Ok(())
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. a pre-built provider on the config;
/// 2. `provider_name` + `model` from the config / CLI;
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, both set;
/// 4. `GEMINI_API_KEY` → gemini with [`DEFAULT_MODEL`];
/// 5. whatever `ProviderFactory::from_env` detects.
pub fn resolve_provider(config: &PipelineConfig) -> Result<Arc<dyn LLMProvider>, CorpusError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_provider(&prov, &env_model);
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        check_api_key("GEMINI_API_KEY", &key)?;
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| CorpusError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (or another provider key) in .env.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

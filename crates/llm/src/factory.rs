//! LLM provider factory.
//!
//! Resolves a [`ProviderKind`] from configuration, builds the matching adapter
//! and wraps it in the retry decorator.

use crate::client::LlmClient;
use crate::providers::{GeminiClient, MiddlewareClient, OllamaClient};
use crate::retry::{RetryPolicy, RetryingClient};
use crate::types::{MiddlewareUpstream, ProviderKind};
use nyaya_core::config::LlmSettings;
use nyaya_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create the client for the active provider in `settings`.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required secret
/// is missing.
pub fn create_client(settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    create_client_for(&settings.provider, settings)
}

/// Create a client for a named provider, using the shared generation settings.
pub fn create_client_for(provider: &str, settings: &LlmSettings) -> AppResult<Arc<dyn LlmClient>> {
    let kind = ProviderKind::parse(provider).ok_or_else(|| {
        AppError::Config(format!(
            "Unknown provider: {}. Supported: local, cloud, multiprovider",
            provider
        ))
    })?;

    let timeout = Duration::from_secs(settings.timeout_secs);

    let client: Arc<dyn LlmClient> = match kind {
        ProviderKind::Local => Arc::new(OllamaClient::with_base_url(
            settings.local.endpoint.clone(),
            timeout,
        )),
        ProviderKind::Cloud => {
            let api_key = settings
                .cloud
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    AppError::Config("Cloud provider requires GEMINI_API_KEY".to_string())
                })?;
            Arc::new(GeminiClient::new(
                settings.cloud.endpoint.clone(),
                api_key,
                settings.cloud.max_output_tokens,
                Duration::from_secs(settings.cloud.timeout_secs),
            ))
        }
        ProviderKind::Multiprovider => {
            let mp = &settings.multiprovider;
            let secret = mp.secret.clone().filter(|s| !s.is_empty()).ok_or_else(|| {
                AppError::Config("Multiprovider requires LLM_MIDDLEWARE_SECRET".to_string())
            })?;
            let upstream = MiddlewareUpstream::parse(&mp.upstream).ok_or_else(|| {
                AppError::Config(format!("Unknown middleware upstream: {}", mp.upstream))
            })?;
            Arc::new(MiddlewareClient::new(
                &mp.url,
                secret,
                upstream,
                mp.model.clone(),
                mp.use_socket,
                Duration::from_secs(mp.connect_timeout_secs),
                timeout,
            ))
        }
    };

    tracing::debug!("Created '{}' generation client", kind.as_str());

    let policy = RetryPolicy {
        max_retries: settings.connect_retries,
        backoff: Duration::from_millis(settings.retry_backoff_ms),
    };
    Ok(Arc::new(RetryingClient::new(client, policy)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_local_client() {
        let client = create_client(&LlmSettings::default()).unwrap();
        assert_eq!(client.provider_name(), "local");
    }

    #[test]
    fn test_cloud_requires_api_key() {
        let mut settings = LlmSettings::default();
        settings.provider = "cloud".to_string();
        match create_client(&settings) {
            Err(err) => assert!(err.to_string().contains("GEMINI_API_KEY")),
            Ok(_) => panic!("Expected error for cloud without API key"),
        }

        settings.cloud.api_key = Some("key".to_string());
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "cloud");
    }

    #[test]
    fn test_multiprovider_requires_secret() {
        let mut settings = LlmSettings::default();
        settings.provider = "multiprovider".to_string();
        assert!(create_client(&settings).is_err());

        settings.multiprovider.secret = Some("secret".to_string());
        settings.multiprovider.use_socket = false;
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "multiprovider");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client_for("unknown", &LlmSettings::default()) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}

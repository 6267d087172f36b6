//! The uniform provider client.
//!
//! One [`ProviderClient`] fronts every enumerated provider: implemented ones
//! get a real HTTP call, the rest get an [`Invocation::Skipped`] outcome.
//! Credentials are an injected capability table, so "is this provider
//! available" is decided here, declaratively, rather than scattered through
//! the monitoring loop. No retries happen at this layer.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use crate::error::ProviderError;
use crate::provider::{Invocation, Provider, SkipReason};
use crate::types::{
    AnthropicRequest, AnthropicResponse, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage,
};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_COMPLETION_TOKENS: u32 = 1024;

/// API keys for the implemented providers. `None` means the provider is
/// configured out and invocations skip with
/// [`SkipReason::MissingCredentials`].
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

/// Model identifiers used for completions, one per implemented provider.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub openai: String,
    pub anthropic: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            openai: "gpt-4o-mini".to_string(),
            anthropic: "claude-3-5-haiku-latest".to_string(),
        }
    }
}

/// Client for submitting prompts to AI chat providers.
///
/// Use [`ProviderClient::new`] for production or
/// [`ProviderClient::with_base_urls`] to point at a mock server in tests.
pub struct ProviderClient {
    client: Client,
    credentials: ProviderCredentials,
    models: ModelConfig,
    openai_base_url: Url,
    anthropic_base_url: Url,
}

impl ProviderClient {
    /// Creates a client pointed at the production provider endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        credentials: ProviderCredentials,
        models: ModelConfig,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        Self::with_base_urls(
            credentials,
            models,
            timeout_secs,
            DEFAULT_OPENAI_BASE_URL,
            DEFAULT_ANTHROPIC_BASE_URL,
        )
    }

    /// Creates a client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ProviderError::Api`] if a base URL is
    /// invalid.
    pub fn with_base_urls(
        credentials: ProviderCredentials,
        models: ModelConfig,
        timeout_secs: u64,
        openai_base_url: &str,
        anthropic_base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("aivis/0.1 (brand-visibility)")
            .build()?;

        Ok(Self {
            client,
            credentials,
            models,
            openai_base_url: parse_base_url(openai_base_url)?,
            anthropic_base_url: parse_base_url(anthropic_base_url)?,
        })
    }

    /// Submits `prompt` to `provider` and returns the raw response text.
    ///
    /// Unimplemented providers and implemented providers without configured
    /// credentials yield `Ok(Invocation::Skipped(..))` — a deliberate skip,
    /// not an error.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Http`] on timeout, network failure, or a non-2xx
    ///   HTTP status.
    /// - [`ProviderError::Api`] if the provider answered with an unusable
    ///   (e.g. empty) completion.
    /// - [`ProviderError::Deserialize`] if the response body does not match
    ///   the expected shape.
    pub async fn invoke(
        &self,
        provider: Provider,
        prompt: &str,
    ) -> Result<Invocation, ProviderError> {
        tracing::debug!(%provider, prompt_chars = prompt.chars().count(), "submitting prompt");
        match provider {
            Provider::OpenAi => match &self.credentials.openai_api_key {
                Some(key) => self
                    .invoke_openai(key, prompt)
                    .await
                    .map(Invocation::Completed),
                None => Ok(Invocation::Skipped(SkipReason::MissingCredentials)),
            },
            Provider::Anthropic => match &self.credentials.anthropic_api_key {
                Some(key) => self
                    .invoke_anthropic(key, prompt)
                    .await
                    .map(Invocation::Completed),
                None => Ok(Invocation::Skipped(SkipReason::MissingCredentials)),
            },
            Provider::Gemini | Provider::Perplexity | Provider::Grok => {
                Ok(Invocation::Skipped(SkipReason::NotImplemented))
            }
        }
    }

    async fn invoke_openai(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = join_url(&self.openai_base_url, "v1/chat/completions");
        let body = ChatCompletionRequest {
            model: &self.models.openai,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        let response: ChatCompletionResponse = self
            .request_json(
                self.client.post(url.clone()).bearer_auth(api_key).json(&body),
                &url,
            )
            .await?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::Api("openai returned an empty completion".to_string()));
        }
        Ok(text)
    }

    async fn invoke_anthropic(&self, api_key: &str, prompt: &str) -> Result<String, ProviderError> {
        let url = join_url(&self.anthropic_base_url, "v1/messages");
        let body = AnthropicRequest {
            model: &self.models.anthropic,
            max_tokens: MAX_COMPLETION_TOKENS,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response: AnthropicResponse = self
            .request_json(
                self.client
                    .post(url.clone())
                    .header("x-api-key", api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&body),
                &url,
            )
            .await?;

        let text: String = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(ProviderError::Api(
                "anthropic returned an empty completion".to_string(),
            ));
        }
        Ok(text)
    }

    /// Sends a request, asserts a 2xx HTTP status, and parses the response
    /// body as JSON into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] on network failure or a non-2xx
    /// status, [`ProviderError::Deserialize`] if the body does not parse.
    async fn request_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> Result<T, ProviderError> {
        let response = request.send().await?;
        let response = response.error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

/// Normalise: ensure the base URL ends with exactly one slash so that
/// `Url::join` appends rather than replacing the last path segment.
fn parse_base_url(base_url: &str) -> Result<Url, ProviderError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised)
        .map_err(|e| ProviderError::Api(format!("invalid base URL '{base_url}': {e}")))
}

fn join_url(base: &Url, path: &str) -> Url {
    // parse_base_url guarantees a trailing slash, so join cannot fail
    // for the fixed relative paths used here.
    base.join(path).unwrap_or_else(|_| base.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> ProviderClient {
        ProviderClient::with_base_urls(
            ProviderCredentials::default(),
            ModelConfig::default(),
            30,
            "http://127.0.0.1:9",
            "http://127.0.0.1:9",
        )
        .expect("client construction should not fail")
    }

    #[test]
    fn base_url_gains_trailing_slash() {
        let url = parse_base_url("https://api.openai.com").expect("parse");
        assert_eq!(url.as_str(), "https://api.openai.com/");
        assert_eq!(
            join_url(&url, "v1/chat/completions").as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn base_url_collapses_extra_slashes() {
        let url = parse_base_url("https://api.anthropic.com///").expect("parse");
        assert_eq!(join_url(&url, "v1/messages").as_str(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ProviderClient::with_base_urls(
            ProviderCredentials::default(),
            ModelConfig::default(),
            30,
            "not a url",
            "http://127.0.0.1:9",
        );
        assert!(matches!(result, Err(ProviderError::Api(_))));
    }

    #[tokio::test]
    async fn unimplemented_provider_skips_without_io() {
        // Base URLs point at a dead port; a skip must never touch the network.
        let client = test_client();
        for provider in [Provider::Gemini, Provider::Perplexity, Provider::Grok] {
            let outcome = client.invoke(provider, "anything").await.expect("skip");
            assert_eq!(outcome, Invocation::Skipped(SkipReason::NotImplemented));
        }
    }

    #[tokio::test]
    async fn missing_credentials_skip_without_io() {
        let client = test_client();
        for provider in [Provider::OpenAi, Provider::Anthropic] {
            let outcome = client.invoke(provider, "anything").await.expect("skip");
            assert_eq!(outcome, Invocation::Skipped(SkipReason::MissingCredentials));
        }
    }
}

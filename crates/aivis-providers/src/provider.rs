use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed set of AI chat providers a prompt can target.
///
/// Every variant is a valid configuration value; only
/// [`Provider::is_implemented`] providers produce completions today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    Anthropic,
    Gemini,
    Perplexity,
    Grok,
}

impl Provider {
    pub const ALL: [Provider; 5] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Gemini,
        Provider::Perplexity,
        Provider::Grok,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Anthropic => "anthropic",
            Provider::Gemini => "gemini",
            Provider::Perplexity => "perplexity",
            Provider::Grok => "grok",
        }
    }

    /// Whether a real client exists for this provider. Unimplemented
    /// providers are invokable but always yield a skip outcome.
    #[must_use]
    pub fn is_implemented(self) -> bool {
        matches!(self, Provider::OpenAi | Provider::Anthropic)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider: {0}")]
pub struct UnknownProviderError(pub String);

impl std::str::FromStr for Provider {
    type Err = UnknownProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(Provider::OpenAi),
            "anthropic" => Ok(Provider::Anthropic),
            "gemini" => Ok(Provider::Gemini),
            "perplexity" => Ok(Provider::Perplexity),
            "grok" => Ok(Provider::Grok),
            other => Err(UnknownProviderError(other.to_string())),
        }
    }
}

/// Why a provider invocation was deliberately not attempted.
///
/// Skips are configuration outcomes, not failures: they are counted
/// separately and never persist a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The provider is enumerated but has no client implementation yet.
    NotImplemented,
    /// The provider is implemented but no API key is configured.
    MissingCredentials,
    /// A stored provider name that no longer parses. Produced by the
    /// monitoring loop, never by the client itself.
    UnknownProvider,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::NotImplemented => "not_implemented",
            SkipReason::MissingCredentials => "missing_credentials",
            SkipReason::UnknownProvider => "unknown_provider",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotImplemented => write!(f, "provider not yet implemented"),
            SkipReason::MissingCredentials => write!(f, "no API credentials configured"),
            SkipReason::UnknownProvider => write!(f, "unknown provider name"),
        }
    }
}

/// Outcome of an attempted provider invocation that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// The provider answered; payload is the raw response text.
    Completed(String),
    /// The call was deliberately not made.
    Skipped(SkipReason),
}

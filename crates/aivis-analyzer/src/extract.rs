//! The structured-extraction capability.
//!
//! [`Extractor`] is the seam the orchestrator never looks behind: the
//! production implementation ([`ModelExtractor`]) asks a provider to reduce a
//! response to a fixed JSON shape, while tests plug in [`RuleExtractor`].
//! `Ok(None)` means "no structured data" and routes the caller to the
//! substring fallback; it is never an error.

use async_trait::async_trait;
use serde::Deserialize;

use aivis_providers::{Invocation, Provider, ProviderClient};

use crate::error::ExtractError;

/// Upper bound on response text embedded in the extraction prompt, so one
/// oversized answer cannot blow the secondary call's token budget.
const EXTRACTION_INPUT_CAP: usize = 6_000;

/// Extraction output as the model reports it, before sanitisation.
///
/// Every field except `mentioned` is optional: the model is asked for the
/// full shape, but partial output is still usable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawExtraction {
    pub mentioned: bool,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub competitors: Vec<RawCompetitorMention>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCompetitorMention {
    pub name: String,
    #[serde(default)]
    pub mentioned: Option<bool>,
    #[serde(default)]
    pub position: Option<i32>,
    #[serde(default)]
    pub sentiment: Option<String>,
}

/// Capability to pull a [`RawExtraction`] out of free-form provider text.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Returns `Ok(None)` when no structured data could be obtained — the
    /// extraction provider was unavailable or its output did not parse.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError`] only for transport-level failures of the
    /// extraction call itself; callers treat that the same as `Ok(None)`.
    async fn extract(
        &self,
        response_text: &str,
        brand_name: &str,
    ) -> Result<Option<RawExtraction>, ExtractError>;
}

/// Production extractor: a secondary, extraction-only provider call.
pub struct ModelExtractor {
    client: ProviderClient,
    provider: Provider,
}

impl ModelExtractor {
    #[must_use]
    pub fn new(client: ProviderClient, provider: Provider) -> Self {
        Self { client, provider }
    }
}

#[async_trait]
impl Extractor for ModelExtractor {
    async fn extract(
        &self,
        response_text: &str,
        brand_name: &str,
    ) -> Result<Option<RawExtraction>, ExtractError> {
        let prompt = extraction_prompt(response_text, brand_name);

        match self.client.invoke(self.provider, &prompt).await {
            Ok(Invocation::Completed(text)) => Ok(parse_extraction(&text)),
            Ok(Invocation::Skipped(reason)) => {
                tracing::debug!(provider = %self.provider, %reason, "extraction provider unavailable");
                Ok(None)
            }
            Err(e) => Err(ExtractError::Provider(e)),
        }
    }
}

/// Fixed extraction output for tests: the deterministic rule engine the
/// orchestrator can be wired to without any model in the loop.
#[derive(Debug, Clone, Default)]
pub struct RuleExtractor {
    pub extraction: Option<RawExtraction>,
}

impl RuleExtractor {
    #[must_use]
    pub fn returning(extraction: RawExtraction) -> Self {
        Self {
            extraction: Some(extraction),
        }
    }

    /// An extractor that always reports "no structured data", forcing the
    /// substring fallback.
    #[must_use]
    pub fn unavailable() -> Self {
        Self { extraction: None }
    }
}

#[async_trait]
impl Extractor for RuleExtractor {
    async fn extract(
        &self,
        _response_text: &str,
        _brand_name: &str,
    ) -> Result<Option<RawExtraction>, ExtractError> {
        Ok(self.extraction.clone())
    }
}

/// Parse a JSON object out of model output.
///
/// Models wrap JSON in prose and markdown fences more often than not, so this
/// takes the slice from the first `{` to the last `}` and parses that.
/// Anything that still fails to deserialize is "no structured data", not an
/// error.
#[must_use]
pub fn parse_extraction(text: &str) -> Option<RawExtraction> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn extraction_prompt(response_text: &str, brand_name: &str) -> String {
    let capped = truncate_chars(response_text, EXTRACTION_INPUT_CAP);
    format!(
        "Analyze the following AI assistant answer for brand mentions.\n\
         Target brand: \"{brand_name}\"\n\n\
         Answer:\n---\n{capped}\n---\n\n\
         Respond with ONLY a JSON object, no prose, in this exact shape:\n\
         {{\"mentioned\": bool, \"position\": int 1-10 or null, \
         \"sentiment\": \"positive\"|\"neutral\"|\"negative\", \
         \"competitors\": [{{\"name\": string, \"mentioned\": bool, \
         \"position\": int 1-10 or null, \"sentiment\": string}}]}}\n\
         \"position\" is the rank at which a brand appears if the answer is a \
         ranked or ordered list, otherwise null. \"competitors\" lists every \
         other brand named in the answer."
    )
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

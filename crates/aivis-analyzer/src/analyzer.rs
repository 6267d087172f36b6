//! Analysis entry points and the deterministic fallback.

use std::collections::HashSet;

use crate::extract::{Extractor, RawExtraction};
use crate::types::{CompetitorMention, MentionAnalysis, ResponseAnalysis, Sentiment};

/// Upper bound on competitors taken from one extraction. Anything past this
/// is almost certainly the model hallucinating a directory listing.
const MAX_COMPETITORS: usize = 20;

/// Analyze a provider response for the tracked brand only.
pub async fn analyze(
    extractor: &dyn Extractor,
    response_text: &str,
    brand_name: &str,
) -> MentionAnalysis {
    analyze_all(extractor, response_text, brand_name).await.brand
}

/// Analyze a provider response for the tracked brand and every other brand
/// entity the extraction surfaces.
///
/// Never fails: if structured extraction is unavailable, errors, or does not
/// parse, the result degrades to the substring fallback with an empty
/// competitor list.
pub async fn analyze_all(
    extractor: &dyn Extractor,
    response_text: &str,
    brand_name: &str,
) -> ResponseAnalysis {
    match extractor.extract(response_text, brand_name).await {
        Ok(Some(raw)) => sanitize_extraction(raw, brand_name),
        Ok(None) => ResponseAnalysis {
            brand: fallback_analysis(response_text, brand_name),
            competitors: Vec::new(),
        },
        Err(e) => {
            tracing::warn!(error = %e, "structured extraction failed; using substring fallback");
            ResponseAnalysis {
                brand: fallback_analysis(response_text, brand_name),
                competitors: Vec::new(),
            }
        }
    }
}

/// The floor of correctness: case-insensitive substring presence.
///
/// Yields `mentioned` from presence, no position, neutral sentiment.
/// Requires no external services and must always be available.
#[must_use]
pub fn fallback_analysis(response_text: &str, brand_name: &str) -> MentionAnalysis {
    MentionAnalysis {
        mentioned: contains_ignore_case(response_text, brand_name),
        position: None,
        sentiment: Sentiment::Neutral,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.trim().is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Apply the edge-case policy to raw extraction output.
///
/// Positions are only meaningful when mentioned and must fall in 1..=10;
/// unknown sentiment labels become neutral; competitor entries are trimmed,
/// deduplicated case-insensitively, never include the tracked brand itself,
/// and are capped at [`MAX_COMPETITORS`].
fn sanitize_extraction(raw: RawExtraction, brand_name: &str) -> ResponseAnalysis {
    let brand = MentionAnalysis {
        mentioned: raw.mentioned,
        position: sanitize_position(raw.mentioned, raw.position),
        sentiment: sanitize_sentiment(raw.sentiment.as_deref()),
    };

    let brand_lower = brand_name.trim().to_lowercase();
    let mut seen: HashSet<String> = HashSet::new();
    let mut competitors = Vec::new();

    for entry in raw.competitors {
        let name = entry.name.trim();
        if name.is_empty() {
            continue;
        }
        let lower = name.to_lowercase();
        if lower == brand_lower || !seen.insert(lower) {
            continue;
        }

        let mentioned = entry.mentioned.unwrap_or(true);
        competitors.push(CompetitorMention {
            name: name.to_string(),
            mentioned,
            position: sanitize_position(mentioned, entry.position),
            sentiment: sanitize_sentiment(entry.sentiment.as_deref()),
        });

        if competitors.len() == MAX_COMPETITORS {
            break;
        }
    }

    ResponseAnalysis { brand, competitors }
}

fn sanitize_position(mentioned: bool, position: Option<i32>) -> Option<i32> {
    if !mentioned {
        return None;
    }
    position.filter(|p| (1..=10).contains(p))
}

fn sanitize_sentiment(label: Option<&str>) -> Sentiment {
    label.map_or(Sentiment::Neutral, Sentiment::from_label)
}

//! Mention analysis for provider responses.
//!
//! Providers answer in free-form prose, so extraction of "was the brand
//! mentioned, at what rank, with what sentiment" is itself a secondary model
//! call constrained to a fixed JSON shape. That call is a pluggable
//! [`Extractor`] capability; when it is unavailable or its output fails to
//! parse, analysis degrades to a deterministic case-insensitive substring
//! check that needs no external services at all.

pub mod analyzer;
pub mod error;
pub mod extract;
pub mod types;

pub use analyzer::{analyze, analyze_all, fallback_analysis};
pub use error::ExtractError;
pub use extract::{
    parse_extraction, Extractor, ModelExtractor, RawCompetitorMention, RawExtraction, RuleExtractor,
};
pub use types::{CompetitorMention, MentionAnalysis, ResponseAnalysis, Sentiment};

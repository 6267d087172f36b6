use serde::{Deserialize, Serialize};

/// Sentiment of a brand mention within one provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    /// Lenient parse of an extraction-supplied label.
    ///
    /// Anything that is not unambiguously positive or negative — including
    /// unknown labels and casing noise — classifies as neutral.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured analysis of one brand within one provider response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionAnalysis {
    pub mentioned: bool,
    /// Rank at which the brand appears (1..=10). Only meaningful when
    /// `mentioned` is true; absence of a clear rank is `None`, never 0.
    pub position: Option<i32>,
    pub sentiment: Sentiment,
}

impl MentionAnalysis {
    #[must_use]
    pub fn not_mentioned() -> Self {
        Self {
            mentioned: false,
            position: None,
            sentiment: Sentiment::Neutral,
        }
    }
}

/// A rival brand detected in a provider response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompetitorMention {
    pub name: String,
    pub mentioned: bool,
    pub position: Option<i32>,
    pub sentiment: Sentiment,
}

/// Full analysis of one provider response: the tracked brand plus every
/// other brand entity the extraction surfaced. Zero competitors is a
/// normal outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseAnalysis {
    pub brand: MentionAnalysis,
    pub competitors: Vec<CompetitorMention>,
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use aivis_analyzer::Sentiment;
use aivis_providers::SkipReason;

/// Aggregate counts for one batch run, returned to whatever triggered it.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub prompts_processed: usize,
    pub successful_runs: usize,
    pub errors: usize,
    pub skipped: usize,
    pub completed_at: DateTime<Utc>,
}

/// Outcome of one provider attempt within a prompt run.
///
/// The on-demand path returns these verbatim so a human can see exactly
/// which providers produced data, which were skipped and why, and which
/// failed with what message.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    Completed {
        provider: String,
        result_id: i64,
        mentioned: bool,
        rank_position: Option<i32>,
        sentiment: Sentiment,
        competitors_recorded: usize,
    },
    Skipped {
        provider: String,
        reason: SkipReason,
    },
    Failed {
        provider: String,
        message: String,
    },
}

impl ProviderOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ProviderOutcome::Completed { .. })
    }

    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(self, ProviderOutcome::Skipped { .. })
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, ProviderOutcome::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aivis_providers::SkipReason;

    #[test]
    fn outcome_serializes_with_status_tag() {
        let outcome = ProviderOutcome::Skipped {
            provider: "gemini".to_string(),
            reason: SkipReason::NotImplemented,
        };
        let json = serde_json::to_value(&outcome).expect("serialize");
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["provider"], "gemini");
        assert_eq!(json["reason"], "not_implemented");
    }

    #[test]
    fn outcome_classification_is_exclusive() {
        let completed = ProviderOutcome::Completed {
            provider: "openai".to_string(),
            result_id: 1,
            mentioned: true,
            rank_position: Some(2),
            sentiment: Sentiment::Positive,
            competitors_recorded: 0,
        };
        assert!(completed.is_success());
        assert!(!completed.is_skip());
        assert!(!completed.is_error());

        let failed = ProviderOutcome::Failed {
            provider: "openai".to_string(),
            message: "timeout".to_string(),
        };
        assert!(failed.is_error());
        assert!(!failed.is_success());
    }
}

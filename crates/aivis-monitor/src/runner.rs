//! The batch control loop.
//!
//! States: select batch, then for each prompt, for each configured provider:
//! invoke, analyze, persist. Prompts run strictly one at a time with a fixed
//! pacing delay between them; that is deliberate rate-limit hygiene toward
//! the providers, not a technical limitation. There is no retry anywhere in
//! a run: a failed provider call is counted and the next scheduled batch
//! picks the prompt up again.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;

use aivis_analyzer::{analyze_all, Extractor};
use aivis_db::{MonitoredPromptRow, NewPromptResult};
use aivis_providers::{Invocation, Provider, ProviderClient, SkipReason};

use crate::error::MonitorError;
use crate::resolver::record_competitor_mentions;
use crate::types::{BatchSummary, ProviderOutcome};

/// Orchestrator knobs: how many prompts one batch may take on, and how long
/// to pause between prompts.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub batch_size: i64,
    pub pacing_delay: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            pacing_delay: Duration::from_millis(1000),
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn from_app_config(config: &aivis_core::AppConfig) -> Self {
        Self {
            batch_size: config.monitor_batch_size,
            pacing_delay: Duration::from_millis(config.monitor_delay_ms),
        }
    }
}

/// Run one monitoring batch: subscribed prompts, least-recently-run first,
/// capped at the configured batch size.
///
/// Every selected prompt is attempted exactly once. Provider failures and
/// competitor-side failures are contained and counted; the only batch-fatal
/// condition is failing to read the prompt list itself.
///
/// # Errors
///
/// Returns [`MonitorError::Db`] if the batch cannot be selected.
pub async fn run_monitoring_batch(
    pool: &PgPool,
    client: &ProviderClient,
    extractor: &dyn Extractor,
    config: &MonitorConfig,
) -> Result<BatchSummary, MonitorError> {
    let prompts = aivis_db::list_prompts_for_monitoring(pool, config.batch_size).await?;

    if prompts.is_empty() {
        tracing::info!("monitor: no subscribed prompts; nothing to do");
        return Ok(BatchSummary {
            prompts_processed: 0,
            successful_runs: 0,
            errors: 0,
            skipped: 0,
            completed_at: Utc::now(),
        });
    }

    tracing::info!(count = prompts.len(), "monitor: starting batch");

    let mut successful_runs = 0usize;
    let mut errors = 0usize;
    let mut skipped = 0usize;

    for (index, prompt) in prompts.iter().enumerate() {
        let outcomes = run_prompt(pool, client, extractor, prompt).await;

        for outcome in &outcomes {
            if outcome.is_success() {
                successful_runs += 1;
            } else if outcome.is_skip() {
                skipped += 1;
            } else {
                errors += 1;
            }
        }

        if index + 1 < prompts.len() && !config.pacing_delay.is_zero() {
            tokio::time::sleep(config.pacing_delay).await;
        }
    }

    let summary = BatchSummary {
        prompts_processed: prompts.len(),
        successful_runs,
        errors,
        skipped,
        completed_at: Utc::now(),
    };

    tracing::info!(
        prompts = summary.prompts_processed,
        successes = summary.successful_runs,
        errors = summary.errors,
        skipped = summary.skipped,
        "monitor: batch complete"
    );

    Ok(summary)
}

/// Run exactly one prompt through the same engine as the batch and return
/// the per-provider outcomes. This is the on-demand "run now" shape; it
/// works on unsubscribed prompts too.
///
/// # Errors
///
/// Returns [`MonitorError::PromptNotFound`] if the prompt does not exist,
/// or [`MonitorError::Db`] if it cannot be loaded.
pub async fn run_single_prompt(
    pool: &PgPool,
    client: &ProviderClient,
    extractor: &dyn Extractor,
    prompt_id: i64,
) -> Result<Vec<ProviderOutcome>, MonitorError> {
    let prompt = aivis_db::get_prompt_for_monitoring(pool, prompt_id)
        .await?
        .ok_or(MonitorError::PromptNotFound(prompt_id))?;

    Ok(run_prompt(pool, client, extractor, &prompt).await)
}

/// Attempt every provider configured on one prompt, in configured order,
/// then stamp the prompt's freshness timestamp.
///
/// The stamp happens unconditionally, even when every provider failed, so a
/// permanently-failing prompt ages to the back of the batch order instead of
/// starving other prompts of batch slots.
async fn run_prompt(
    pool: &PgPool,
    client: &ProviderClient,
    extractor: &dyn Extractor,
    prompt: &MonitoredPromptRow,
) -> Vec<ProviderOutcome> {
    let mut outcomes = Vec::with_capacity(prompt.providers.len());

    for provider_name in &prompt.providers {
        outcomes.push(run_provider(pool, client, extractor, prompt, provider_name).await);
    }

    if let Err(e) = aivis_db::touch_prompt_last_run(pool, prompt.id).await {
        tracing::error!(
            prompt_id = prompt.id,
            error = %e,
            "monitor: failed to stamp last_run_at"
        );
    }

    outcomes
}

/// One provider attempt: invoke, analyze, persist the result row, then
/// best-effort competitor handling.
///
/// A failure after the `prompt_results` insert never invalidates that row;
/// competitor bookkeeping is its own blast radius.
async fn run_provider(
    pool: &PgPool,
    client: &ProviderClient,
    extractor: &dyn Extractor,
    prompt: &MonitoredPromptRow,
    provider_name: &str,
) -> ProviderOutcome {
    let Ok(provider) = provider_name.parse::<Provider>() else {
        tracing::warn!(
            prompt_id = prompt.id,
            provider = provider_name,
            "monitor: prompt names an unknown provider; skipping"
        );
        return ProviderOutcome::Skipped {
            provider: provider_name.to_string(),
            reason: SkipReason::UnknownProvider,
        };
    };

    let response_text = match client.invoke(provider, &prompt.text).await {
        Ok(Invocation::Completed(text)) => text,
        Ok(Invocation::Skipped(reason)) => {
            tracing::debug!(prompt_id = prompt.id, %provider, %reason, "monitor: provider skipped");
            return ProviderOutcome::Skipped {
                provider: provider.as_str().to_string(),
                reason,
            };
        }
        Err(e) => {
            tracing::warn!(prompt_id = prompt.id, %provider, error = %e, "monitor: provider call failed");
            return ProviderOutcome::Failed {
                provider: provider.as_str().to_string(),
                message: e.to_string(),
            };
        }
    };

    let analysis = analyze_all(extractor, &response_text, &prompt.brand_name).await;

    let result_id = match aivis_db::insert_prompt_result(
        pool,
        &NewPromptResult {
            prompt_id: prompt.id,
            provider: provider.as_str(),
            mentioned: analysis.brand.mentioned,
            rank_position: analysis.brand.position,
            sentiment: analysis.brand.sentiment.as_str(),
            response_text: &response_text,
        },
    )
    .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(prompt_id = prompt.id, %provider, error = %e, "monitor: failed to persist result");
            return ProviderOutcome::Failed {
                provider: provider.as_str().to_string(),
                message: e.to_string(),
            };
        }
    };

    let competitors_recorded = record_competitor_mentions(
        pool,
        prompt.brand_id,
        Utc::now().date_naive(),
        &analysis.competitors,
    )
    .await;

    ProviderOutcome::Completed {
        provider: provider.as_str().to_string(),
        result_id,
        mentioned: analysis.brand.mentioned,
        rank_position: analysis.brand.position,
        sentiment: analysis.brand.sentiment,
        competitors_recorded,
    }
}

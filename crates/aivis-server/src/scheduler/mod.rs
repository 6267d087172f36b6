//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! recurring monitoring batch and the daily brand-metric rollup.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use aivis_analyzer::Extractor;
use aivis_monitor::MonitorConfig;
use aivis_providers::ProviderClient;

/// Builds and starts the background job scheduler.
///
/// Registers all recurring jobs and starts the scheduler. Returns the
/// running [`JobScheduler`] handle, which must be kept alive for the
/// lifetime of the process; dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<aivis_core::AppConfig>,
    client: Arc<ProviderClient>,
    extractor: Arc<dyn Extractor>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_monitoring_job(&scheduler, pool.clone(), Arc::clone(&config), client, extractor)
        .await?;
    register_rollup_job(&scheduler, pool).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily monitoring batch.
///
/// Runs at 05:00 UTC by default (`0 0 5 * * *`) and can be overridden with
/// `AIVIS_MONITOR_CRON`. Each firing selects the stalest subscribed prompts
/// and drives them through the full pipeline; failed prompts are not retried
/// within a run, they simply come back around in a later batch.
async fn register_monitoring_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<aivis_core::AppConfig>,
    client: Arc<ProviderClient>,
    extractor: Arc<dyn Extractor>,
) -> Result<(), JobSchedulerError> {
    let cron = std::env::var("AIVIS_MONITOR_CRON").unwrap_or_else(|_| "0 0 5 * * *".to_string());
    let monitor_config = MonitorConfig::from_app_config(&config);
    let pool = Arc::new(pool);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let client = Arc::clone(&client);
        let extractor = Arc::clone(&extractor);
        let monitor_config = monitor_config.clone();

        Box::pin(async move {
            tracing::info!("scheduler: starting monitoring batch");
            match aivis_monitor::run_monitoring_batch(
                &pool,
                &client,
                extractor.as_ref(),
                &monitor_config,
            )
            .await
            {
                Ok(summary) => {
                    tracing::info!(
                        prompts = summary.prompts_processed,
                        successes = summary.successful_runs,
                        errors = summary.errors,
                        skipped = summary.skipped,
                        "scheduler: monitoring batch complete"
                    );
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: monitoring batch failed");
                }
            }
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered monitoring job");
    Ok(())
}

/// Register the daily brand-metric rollup.
///
/// Runs at 05:30 UTC by default (`0 30 5 * * *`, after the monitoring batch)
/// and can be overridden with `AIVIS_ROLLUP_CRON`. Recomputes each active
/// brand's current-day metric row from that day's prompt results.
async fn register_rollup_job(
    scheduler: &JobScheduler,
    pool: PgPool,
) -> Result<(), JobSchedulerError> {
    let cron = std::env::var("AIVIS_ROLLUP_CRON").unwrap_or_else(|_| "0 30 5 * * *".to_string());
    let pool = Arc::new(pool);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            tracing::info!("scheduler: starting brand-metric rollup");
            run_rollup_job(&pool).await;
            tracing::info!("scheduler: brand-metric rollup complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered rollup job");
    Ok(())
}

/// Drive the rollup for all active brands. Individual brand failures are
/// logged but do not abort the run.
async fn run_rollup_job(pool: &PgPool) {
    let brands = match aivis_db::list_active_brands(pool).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: rollup failed to list brands");
            return;
        }
    };

    if brands.is_empty() {
        tracing::info!("scheduler: rollup: no active brands; skipping");
        return;
    }

    let today = Utc::now().date_naive();

    for brand in &brands {
        match aivis_db::refresh_brand_metric(pool, brand.id, today).await {
            Ok(()) => {
                tracing::info!(brand = %brand.slug, date = %today, "scheduler: rollup: brand metric refreshed");
            }
            Err(e) => {
                tracing::warn!(brand = %brand.slug, error = %e, "scheduler: rollup: refresh failed");
            }
        }
    }
}

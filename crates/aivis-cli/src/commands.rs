//! Command bodies for the CLI. Each command loads config, connects a pool,
//! and drives the same library crates the server uses.

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;

use aivis_analyzer::ModelExtractor;
use aivis_monitor::{MonitorConfig, ProviderOutcome};
use aivis_providers::{ModelConfig, Provider, ProviderClient, ProviderCredentials};

async fn connect(config: &aivis_core::AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = aivis_db::PoolConfig::from_app_config(config);
    let pool = aivis_db::connect_pool(&config.database_url, pool_config)
        .await
        .context("failed to connect to database")?;
    Ok(pool)
}

fn build_client(config: &aivis_core::AppConfig) -> anyhow::Result<ProviderClient> {
    let credentials = ProviderCredentials {
        openai_api_key: config.openai_api_key.clone(),
        anthropic_api_key: config.anthropic_api_key.clone(),
    };
    let models = ModelConfig {
        openai: config.openai_model.clone(),
        anthropic: config.anthropic_model.clone(),
    };
    Ok(ProviderClient::new(
        credentials,
        models,
        config.provider_timeout_secs,
    )?)
}

pub async fn migrate() -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let pool = connect(&config).await?;
    let applied = aivis_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

pub async fn seed() -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let seed_file = aivis_core::load_seed(&config.seed_path)?;
    let pool = connect(&config).await?;

    let count = aivis_db::seed_brands(&pool, &seed_file.brands).await?;
    println!("seeded {count} brand(s) from {}", config.seed_path.display());
    Ok(())
}

pub async fn run(prompt_id: Option<i64>) -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let pool = connect(&config).await?;
    let client = build_client(&config)?;

    let extraction_provider: Provider = config
        .extraction_provider
        .parse()
        .with_context(|| format!("AIVIS_EXTRACTION_PROVIDER={}", config.extraction_provider))?;
    let extractor = ModelExtractor::new(build_client(&config)?, extraction_provider);

    match prompt_id {
        Some(id) => {
            let outcomes = aivis_monitor::run_single_prompt(&pool, &client, &extractor, id).await?;
            for outcome in &outcomes {
                print_outcome(outcome);
            }
        }
        None => {
            let monitor_config = MonitorConfig::from_app_config(&config);
            let summary =
                aivis_monitor::run_monitoring_batch(&pool, &client, &extractor, &monitor_config)
                    .await?;
            println!(
                "batch complete: {} prompt(s), {} successful run(s), {} error(s), {} skipped",
                summary.prompts_processed, summary.successful_runs, summary.errors, summary.skipped
            );
        }
    }

    Ok(())
}

pub async fn report(date: Option<NaiveDate>, brand_slug: Option<&str>) -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let pool = connect(&config).await?;
    let date = date.unwrap_or_else(|| Utc::now().date_naive());

    let brands = match brand_slug {
        Some(slug) => {
            let brand = aivis_db::get_brand_by_slug(&pool, slug)
                .await?
                .with_context(|| format!("brand '{slug}' not found"))?;
            vec![brand]
        }
        None => aivis_db::list_active_brands(&pool).await?,
    };

    for brand in &brands {
        aivis_db::refresh_brand_metric(&pool, brand.id, date).await?;
        println!("{}: metrics refreshed for {date}", brand.slug);
    }

    Ok(())
}

pub async fn list_prompts(brand_slug: &str) -> anyhow::Result<()> {
    let config = aivis_core::load_app_config()?;
    let pool = connect(&config).await?;

    let brand = aivis_db::get_brand_by_slug(&pool, brand_slug)
        .await?
        .with_context(|| format!("brand '{brand_slug}' not found"))?;
    let prompts = aivis_db::list_prompts_for_brand(&pool, brand.id).await?;

    if prompts.is_empty() {
        println!("no prompts for brand '{brand_slug}'");
        return Ok(());
    }

    for prompt in &prompts {
        let last_run = prompt
            .last_run_at
            .map_or_else(|| "never".to_string(), |t| t.to_rfc3339());
        println!(
            "[{}] {} (providers: {}, subscribed: {}, last run: {})",
            prompt.id,
            prompt.text,
            prompt.providers.join(", "),
            prompt.is_subscribed,
            last_run
        );
    }

    Ok(())
}

fn print_outcome(outcome: &ProviderOutcome) {
    match outcome {
        ProviderOutcome::Completed {
            provider,
            result_id,
            mentioned,
            rank_position,
            sentiment,
            competitors_recorded,
        } => {
            let position = rank_position.map_or_else(|| "-".to_string(), |p| p.to_string());
            println!(
                "{provider}: ok (result {result_id}, mentioned: {mentioned}, \
                 position: {position}, sentiment: {sentiment}, \
                 competitors recorded: {competitors_recorded})"
            );
        }
        ProviderOutcome::Skipped { provider, reason } => {
            println!("{provider}: skipped ({reason})");
        }
        ProviderOutcome::Failed { provider, message } => {
            println!("{provider}: failed ({message})");
        }
    }
}

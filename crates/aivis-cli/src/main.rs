mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "aivis-cli")]
#[command(about = "AIVIS command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate,
    /// Upsert brands and prompts from the seed file.
    Seed,
    /// Run the monitoring pipeline: a full batch, or one prompt with
    /// `--prompt-id`.
    Run {
        #[arg(long)]
        prompt_id: Option<i64>,
    },
    /// Recompute brand-level daily metrics from prompt results.
    Report {
        /// Date to roll up (defaults to today, UTC).
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Limit the rollup to one brand slug.
        #[arg(long)]
        brand: Option<String>,
    },
    /// List prompts for a brand.
    Prompts {
        #[arg(long)]
        brand: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Migrate => commands::migrate().await,
        Commands::Seed => commands::seed().await,
        Commands::Run { prompt_id } => commands::run(prompt_id).await,
        Commands::Report { date, brand } => commands::report(date, brand.as_deref()).await,
        Commands::Prompts { brand } => commands::list_prompts(&brand).await,
    }
}

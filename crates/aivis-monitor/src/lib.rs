//! The monitoring pipeline.
//!
//! Drives prompt batches through provider invocation, mention analysis,
//! competitor resolution, and per-day metric aggregation. One logical worker
//! processes prompts sequentially with a pacing delay between them; failures
//! are contained at the smallest sensible granularity (one provider, one
//! competitor) so a single bad call never takes down a batch.

pub mod aggregator;
pub mod error;
pub mod resolver;
pub mod runner;
pub mod types;

pub use aggregator::{apply_observation, record_observation, Observation};
pub use error::MonitorError;
pub use resolver::record_competitor_mentions;
pub use runner::{run_monitoring_batch, run_single_prompt, MonitorConfig};
pub use types::{BatchSummary, ProviderOutcome};

use thiserror::Error;

use aivis_db::DbError;

/// Batch-fatal failures. Everything narrower (a provider call, one
/// competitor's persistence) is contained inside the run and surfaces only
/// in counters and logs.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("prompt {0} not found")]
    PromptNotFound(i64),

    #[error(transparent)]
    Db(#[from] DbError),
}

//! Shared configuration for AIVIS.
//!
//! Holds the env-driven application config, the YAML seed-file model
//! (brands and the prompts tracked for each), and `ConfigError`.

use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod seed;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use seed::{load_seed, BrandSeed, PromptSeed, SeedFile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read seed file {path}: {source}")]
    SeedFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse seed file: {0}")]
    SeedFileParse(#[from] serde_yaml::Error),
    #[error("seed validation failed: {0}")]
    Validation(String),
}

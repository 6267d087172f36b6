//! HTTP clients for the AI chat providers AIVIS monitors.
//!
//! Wraps `reqwest` with per-provider request/response shapes, bounded
//! timeouts, and typed errors. Only a subset of the enumerated providers is
//! wired up; invoking the rest yields a [`SkipReason`]-tagged skip rather
//! than an error, so the monitoring loop can report "not yet implemented"
//! distinctly from a failure.

pub mod client;
pub mod error;
pub mod provider;

mod types;

pub use client::{ModelConfig, ProviderClient, ProviderCredentials};
pub use error::ProviderError;
pub use provider::{Invocation, Provider, SkipReason, UnknownProviderError};

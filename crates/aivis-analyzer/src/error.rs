use thiserror::Error;

use aivis_providers::ProviderError;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction call failed: {0}")]
    Provider(#[from] ProviderError),
}

//! Provider automation error types.

use skyshim_core::{ProviderName, ValidationError};
use thiserror::Error;

/// Result type alias for provider automation calls.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Errors raised by a single provider automation call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The deployment spec was rejected locally; nothing was sent.
    #[error("invalid deployment spec: {0}")]
    Validation(#[from] ValidationError),

    /// The remote call failed. Never retried at this layer.
    #[error("{provider} {operation} failed: {source:#}")]
    Api {
        provider: ProviderName,
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ProviderError {
    pub(crate) fn api(provider: ProviderName, operation: &'static str, source: anyhow::Error) -> Self {
        ProviderError::Api {
            provider,
            operation,
            source,
        }
    }
}

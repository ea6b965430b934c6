//! Orchestrator error types.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use skyshim_core::{ConfigError, ProviderName};
use skyshim_provider::ProviderError;

/// Result type alias for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Errors surfaced by the orchestrator, per provider or per call.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("provider not configured: {0}")]
    UnknownProvider(ProviderName),

    #[error("{provider} did not finish within {timeout:?}")]
    Timeout {
        provider: ProviderName,
        timeout: Duration,
    },

    #[error("{provider} task failed: {reason}")]
    TaskFailed {
        provider: ProviderName,
        reason: String,
    },
}

/// Stable, serializable discriminant of an [`OrchestratorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Validation,
    ProviderApi,
    UnknownProvider,
    Timeout,
    TaskFailed,
}

impl OrchestratorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrchestratorError::Config(_) => ErrorKind::Configuration,
            OrchestratorError::Provider(ProviderError::Validation(_)) => ErrorKind::Validation,
            OrchestratorError::Provider(ProviderError::Api { .. }) => ErrorKind::ProviderApi,
            OrchestratorError::UnknownProvider(_) => ErrorKind::UnknownProvider,
            OrchestratorError::Timeout { .. } => ErrorKind::Timeout,
            OrchestratorError::TaskFailed { .. } => ErrorKind::TaskFailed,
        }
    }
}

//! Error types for configuration and deployment validation.

use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Bad or missing configuration. Raised before any provider is contacted.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("no cloud providers configured")]
    NoProviders,

    #[error("unknown cloud provider: {0}")]
    UnknownProvider(String),

    #[error("cloud provider listed more than once: {0}")]
    DuplicateProvider(String),

    #[error("missing [infrastructure.{0}] deployment section")]
    MissingInfrastructure(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// A deployment spec that violates one of its field invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("app_name must not be empty")]
    EmptyAppName,

    #[error("image_ref must not be empty")]
    EmptyImageRef,

    #[error("cpu_units must be greater than zero, got {0}")]
    CpuUnits(u32),

    #[error("memory_mib must be greater than zero, got {0}")]
    MemoryMib(u32),

    #[error("container_port must be within 1..=65535, got {0}")]
    ContainerPort(u32),
}

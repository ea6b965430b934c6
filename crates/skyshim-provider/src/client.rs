//! The provider client collaborator contract.
//!
//! A `ProviderClient` is the thin SDK-facing handle for one cloud. It is
//! deliberately primitive: list, register a deployment artifact, put an
//! alarm, nudge capacity up or down. Everything else lives in the
//! automation layer above it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use skyshim_core::config::ProviderSettings;
use skyshim_core::{InstanceSummary, ProviderName};

/// Raw primitives a cloud SDK wrapper must expose.
///
/// Implementations own retry policy, pagination and auth. A listing must
/// either return every instance or fail; truncated results are a bug.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn list_instances(&self) -> anyhow::Result<Vec<InstanceSummary>>;

    /// Register or update a deployment artifact, returning its provider-side reference.
    async fn register_deployment(&self, artifact: &DeploymentArtifact) -> anyhow::Result<String>;

    /// Create or replace the alarm named `alarm.name`.
    async fn put_utilization_alarm(&self, alarm: &AlarmSpec) -> anyhow::Result<()>;

    async fn scale_up(&self) -> anyhow::Result<()>;

    async fn scale_down(&self) -> anyhow::Result<()>;
}

/// Builds the client for one configured provider.
pub trait ProviderFactory: Send + Sync {
    fn client(&self, settings: &ProviderSettings) -> anyhow::Result<Box<dyn ProviderClient>>;
}

/// The provider-native shape a deployment is registered as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// ECS task definition.
    TaskDefinition,
    /// Cloud Run service.
    Service,
    /// Container instance group.
    ContainerGroup,
}

/// A deployment translated into one provider's resource vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentArtifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub image_ref: String,
    /// CPU in the provider's native notation ("256", "250m", "0.25").
    pub cpu: String,
    /// Memory in the provider's native notation ("512", "512Mi", "0.5").
    pub memory: String,
    pub container_port: u16,
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Statistic {
    Average,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    GreaterThan,
}

/// A CPU-utilization alarm definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSpec {
    pub provider: ProviderName,
    pub name: String,
    /// Metric namespace, where the provider has one.
    pub namespace: Option<String>,
    pub metric_name: String,
    pub statistic: Statistic,
    pub comparison: Comparison,
    pub threshold_percent: f64,
    pub period_secs: u32,
    pub evaluation_periods: u32,
}

impl AlarmSpec {
    /// Name shared by every alarm skyshim manages, so re-configuring replaces it.
    pub const NAME: &'static str = "skyshim-cpu-utilization-high";
    pub const PERIOD_SECS: u32 = 300;
    pub const EVALUATION_PERIODS: u32 = 2;

    /// The fixed alarm shape: average over 2 × 300s, fires when greater than threshold.
    pub fn cpu_high(
        provider: ProviderName,
        namespace: Option<&str>,
        metric_name: &str,
        threshold_percent: f64,
    ) -> Self {
        Self {
            provider,
            name: Self::NAME.to_string(),
            namespace: namespace.map(str::to_string),
            metric_name: metric_name.to_string(),
            statistic: Statistic::Average,
            comparison: Comparison::GreaterThan,
            threshold_percent,
            period_secs: Self::PERIOD_SECS,
            evaluation_periods: Self::EVALUATION_PERIODS,
        }
    }
}

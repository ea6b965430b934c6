//! The uniform automation contract and the flow shared by every variant.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use skyshim_core::config::DEFAULT_CPU_THRESHOLD;
use skyshim_core::{
    epoch_secs, DeployResult, DeploymentSpec, InstanceSummary, ProviderName, ScalingDecision,
    ValidationError,
};

use crate::aws::AwsAutomation;
use crate::azure::AzureAutomation;
use crate::client::{AlarmSpec, DeploymentArtifact, ProviderClient};
use crate::error::{ProviderError, ProviderResult};
use crate::gcp::GcpAutomation;

/// Everything the orchestrator can ask of one provider.
#[async_trait]
pub trait ProviderAutomation: Send + Sync {
    fn provider(&self) -> ProviderName;

    /// List every instance the provider reports, or fail as a whole.
    async fn list_instances(&self) -> ProviderResult<Vec<InstanceSummary>>;

    /// Validate `spec` and register it remotely. Not deduplicated here.
    async fn deploy(&self, spec: &DeploymentSpec) -> ProviderResult<DeployResult>;

    /// Create or replace the single CPU-utilization alarm.
    async fn configure_monitoring(&self, threshold_percent: f64) -> ProviderResult<()>;

    /// Carry out a scaling decision. `NoOp` makes no remote call.
    async fn apply(&self, decision: &ScalingDecision) -> ProviderResult<()>;

    /// `configure_monitoring` at the default 80% threshold.
    async fn configure_default_monitoring(&self) -> ProviderResult<()> {
        self.configure_monitoring(DEFAULT_CPU_THRESHOLD).await
    }
}

/// Pick the automation variant for `provider`. Done once, at build time.
pub fn automation_for(
    provider: ProviderName,
    client: Box<dyn ProviderClient>,
) -> Arc<dyn ProviderAutomation> {
    match provider {
        ProviderName::Aws => Arc::new(AwsAutomation::new(client)),
        ProviderName::Gcp => Arc::new(GcpAutomation::new(client)),
        ProviderName::Azure => Arc::new(AzureAutomation::new(client)),
    }
}

/// Client handle plus the call flow common to all variants.
///
/// Variants differ only in how a spec becomes a [`DeploymentArtifact`]
/// and which metric an alarm watches.
pub(crate) struct AutomationCore {
    provider: ProviderName,
    client: Box<dyn ProviderClient>,
}

impl AutomationCore {
    pub(crate) fn new(provider: ProviderName, client: Box<dyn ProviderClient>) -> Self {
        Self { provider, client }
    }

    pub(crate) fn provider(&self) -> ProviderName {
        self.provider
    }

    pub(crate) async fn list_instances(&self) -> ProviderResult<Vec<InstanceSummary>> {
        let instances = self
            .client
            .list_instances()
            .await
            .map_err(|e| ProviderError::api(self.provider, "list_instances", e))?;
        debug!(provider = %self.provider, count = instances.len(), "instances listed");
        Ok(instances)
    }

    pub(crate) async fn deploy(
        &self,
        spec: &DeploymentSpec,
        artifact: DeploymentArtifact,
    ) -> ProviderResult<DeployResult> {
        let provider_ref = self
            .client
            .register_deployment(&artifact)
            .await
            .map_err(|e| ProviderError::api(self.provider, "register_deployment", e))?;

        info!(
            provider = %self.provider,
            app = %spec.app_name,
            kind = ?artifact.kind,
            %provider_ref,
            "deployment registered"
        );

        Ok(DeployResult {
            app_name: spec.app_name.clone(),
            provider_ref,
            deployed_at: epoch_secs(),
        })
    }

    pub(crate) async fn put_alarm(&self, alarm: AlarmSpec) -> ProviderResult<()> {
        self.client
            .put_utilization_alarm(&alarm)
            .await
            .map_err(|e| ProviderError::api(self.provider, "put_utilization_alarm", e))?;
        info!(
            provider = %self.provider,
            alarm = %alarm.name,
            metric = %alarm.metric_name,
            threshold = alarm.threshold_percent,
            "utilization alarm configured"
        );
        Ok(())
    }

    pub(crate) async fn apply(&self, decision: &ScalingDecision) -> ProviderResult<()> {
        let cpu = decision.sample().cpu_usage_percent;
        let threshold = decision.threshold();
        match decision {
            ScalingDecision::ScaleUp { .. } => {
                self.client
                    .scale_up()
                    .await
                    .map_err(|e| ProviderError::api(self.provider, "scale_up", e))?;
                info!(provider = %self.provider, cpu, threshold, "scale-up requested");
            }
            ScalingDecision::ScaleDown { .. } => {
                self.client
                    .scale_down()
                    .await
                    .map_err(|e| ProviderError::api(self.provider, "scale_down", e))?;
                info!(provider = %self.provider, cpu, threshold, "scale-down requested");
            }
            ScalingDecision::NoOp { .. } => {
                debug!(provider = %self.provider, cpu, threshold, "within dead zone, no scaling");
            }
        }
        Ok(())
    }
}

/// Validate a spec and narrow its port for artifact building.
pub(crate) fn checked_port(spec: &DeploymentSpec) -> ProviderResult<u16> {
    spec.validate()?;
    u16::try_from(spec.container_port)
        .map_err(|_| ProviderError::Validation(ValidationError::ContainerPort(spec.container_port)))
}

/// Labels every provider attaches to a registered artifact.
pub(crate) fn default_labels(spec: &DeploymentSpec) -> std::collections::BTreeMap<String, String> {
    std::collections::BTreeMap::from([
        ("app".to_string(), spec.app_name.clone()),
        ("managed-by".to_string(), "skyshim".to_string()),
    ])
}

//! Azure variant: container groups and Azure Monitor metric alerts.

use async_trait::async_trait;

use skyshim_core::{DeployResult, DeploymentSpec, InstanceSummary, ProviderName, ScalingDecision};

use crate::automation::{checked_port, default_labels, AutomationCore, ProviderAutomation};
use crate::client::{AlarmSpec, ArtifactKind, DeploymentArtifact, ProviderClient};
use crate::error::ProviderResult;

const ALARM_NAMESPACE: &str = "Microsoft.Compute/virtualMachines";
const ALARM_METRIC: &str = "Percentage CPU";

pub struct AzureAutomation {
    core: AutomationCore,
}

impl AzureAutomation {
    pub fn new(client: Box<dyn ProviderClient>) -> Self {
        Self {
            core: AutomationCore::new(ProviderName::Azure, client),
        }
    }

    /// A container group. Azure sizes containers in fractional cores and GB.
    fn container_group(spec: &DeploymentSpec) -> ProviderResult<DeploymentArtifact> {
        let port = checked_port(spec)?;
        let cores = f64::from(spec.cpu_units) / 1024.0;
        let memory_gb = f64::from(spec.memory_mib) / 1024.0;
        Ok(DeploymentArtifact {
            kind: ArtifactKind::ContainerGroup,
            name: format!("{}-group", spec.app_name.trim()),
            image_ref: spec.image_ref.clone(),
            cpu: cores.to_string(),
            memory: memory_gb.to_string(),
            container_port: port,
            labels: default_labels(spec),
        })
    }
}

#[async_trait]
impl ProviderAutomation for AzureAutomation {
    fn provider(&self) -> ProviderName {
        self.core.provider()
    }

    async fn list_instances(&self) -> ProviderResult<Vec<InstanceSummary>> {
        self.core.list_instances().await
    }

    async fn deploy(&self, spec: &DeploymentSpec) -> ProviderResult<DeployResult> {
        let artifact = Self::container_group(spec)?;
        self.core.deploy(spec, artifact).await
    }

    async fn configure_monitoring(&self, threshold_percent: f64) -> ProviderResult<()> {
        let alarm = AlarmSpec::cpu_high(
            ProviderName::Azure,
            Some(ALARM_NAMESPACE),
            ALARM_METRIC,
            threshold_percent,
        );
        self.core.put_alarm(alarm).await
    }

    async fn apply(&self, decision: &ScalingDecision) -> ProviderResult<()> {
        self.core.apply(decision).await
    }
}

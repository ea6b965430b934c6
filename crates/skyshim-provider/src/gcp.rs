//! GCP variant: Cloud Run services and Cloud Monitoring alert policies.

use async_trait::async_trait;

use skyshim_core::{DeployResult, DeploymentSpec, InstanceSummary, ProviderName, ScalingDecision};

use crate::automation::{checked_port, default_labels, AutomationCore, ProviderAutomation};
use crate::client::{AlarmSpec, ArtifactKind, DeploymentArtifact, ProviderClient};
use crate::error::ProviderResult;

const ALARM_METRIC: &str = "compute.googleapis.com/instance/cpu/utilization";

pub struct GcpAutomation {
    core: AutomationCore,
}

impl GcpAutomation {
    pub fn new(client: Box<dyn ProviderClient>) -> Self {
        Self {
            core: AutomationCore::new(ProviderName::Gcp, client),
        }
    }

    /// A Cloud Run service. Resource names must be lowercase DNS labels,
    /// CPU is in millicores (1024 units = 1 vCPU) and memory in Mi.
    fn service(spec: &DeploymentSpec) -> ProviderResult<DeploymentArtifact> {
        let port = checked_port(spec)?;
        let millicores = (u64::from(spec.cpu_units) * 1000 / 1024).max(1);
        Ok(DeploymentArtifact {
            kind: ArtifactKind::Service,
            name: service_name(&spec.app_name),
            image_ref: spec.image_ref.clone(),
            cpu: format!("{millicores}m"),
            memory: format!("{}Mi", spec.memory_mib),
            container_port: port,
            labels: default_labels(spec),
        })
    }
}

fn service_name(app_name: &str) -> String {
    app_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[async_trait]
impl ProviderAutomation for GcpAutomation {
    fn provider(&self) -> ProviderName {
        self.core.provider()
    }

    async fn list_instances(&self) -> ProviderResult<Vec<InstanceSummary>> {
        self.core.list_instances().await
    }

    async fn deploy(&self, spec: &DeploymentSpec) -> ProviderResult<DeployResult> {
        let artifact = Self::service(spec)?;
        self.core.deploy(spec, artifact).await
    }

    async fn configure_monitoring(&self, threshold_percent: f64) -> ProviderResult<()> {
        let alarm = AlarmSpec::cpu_high(ProviderName::Gcp, None, ALARM_METRIC, threshold_percent);
        self.core.put_alarm(alarm).await
    }

    async fn apply(&self, decision: &ScalingDecision) -> ProviderResult<()> {
        self.core.apply(decision).await
    }
}

//! AWS variant: ECS task definitions and CloudWatch alarms.

use async_trait::async_trait;

use skyshim_core::{DeployResult, DeploymentSpec, InstanceSummary, ProviderName, ScalingDecision};

use crate::automation::{checked_port, default_labels, AutomationCore, ProviderAutomation};
use crate::client::{AlarmSpec, ArtifactKind, DeploymentArtifact, ProviderClient};
use crate::error::ProviderResult;

const ALARM_NAMESPACE: &str = "AWS/ECS";
const ALARM_METRIC: &str = "CPUUtilization";

pub struct AwsAutomation {
    core: AutomationCore,
}

impl AwsAutomation {
    pub fn new(client: Box<dyn ProviderClient>) -> Self {
        Self {
            core: AutomationCore::new(ProviderName::Aws, client),
        }
    }

    /// A task definition family named after the app. ECS takes CPU units
    /// and MiB as-is.
    fn task_definition(spec: &DeploymentSpec) -> ProviderResult<DeploymentArtifact> {
        let port = checked_port(spec)?;
        Ok(DeploymentArtifact {
            kind: ArtifactKind::TaskDefinition,
            name: spec.app_name.clone(),
            image_ref: spec.image_ref.clone(),
            cpu: spec.cpu_units.to_string(),
            memory: spec.memory_mib.to_string(),
            container_port: port,
            labels: default_labels(spec),
        })
    }
}

#[async_trait]
impl ProviderAutomation for AwsAutomation {
    fn provider(&self) -> ProviderName {
        self.core.provider()
    }

    async fn list_instances(&self) -> ProviderResult<Vec<InstanceSummary>> {
        self.core.list_instances().await
    }

    async fn deploy(&self, spec: &DeploymentSpec) -> ProviderResult<DeployResult> {
        let artifact = Self::task_definition(spec)?;
        self.core.deploy(spec, artifact).await
    }

    async fn configure_monitoring(&self, threshold_percent: f64) -> ProviderResult<()> {
        let alarm = AlarmSpec::cpu_high(
            ProviderName::Aws,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Comparison, Statistic};
    use crate::error::ProviderError;
    use crate::sandbox::{ClientCall, ClientOp, SandboxClient};
    use skyshim_core::{MetricsSample, ValidationError};

    fn spec() -> DeploymentSpec {
        DeploymentSpec {
            app_name: "web".to_string(),
            image_ref: "nginx:1.27".to_string(),
            cpu_units: 256,
            memory_mib: 512,
            container_port: 80,
        }
    }

    #[tokio::test]
    async fn deploy_registers_task_definition() {
        let client = SandboxClient::new(ProviderName::Aws);
        let automation = AwsAutomation::new(Box::new(client.clone()));

        let result = automation.deploy(&spec()).await.unwrap();
        assert_eq!(result.app_name, "web");
        assert_eq!(result.provider_ref, "sandbox://aws/web:1");

        let calls = client.calls().await;
        let ClientCall::RegisterDeployment(artifact) = &calls[0] else {
            panic!("expected a registration, got {calls:?}");
        };
        assert_eq!(artifact.kind, ArtifactKind::TaskDefinition);
        assert_eq!(artifact.cpu, "256");
        assert_eq!(artifact.memory, "512");
        assert_eq!(artifact.labels["managed-by"], "skyshim");
    }

    #[tokio::test]
    async fn invalid_spec_never_reaches_the_client() {
        let client = SandboxClient::new(ProviderName::Aws);
        let automation = AwsAutomation::new(Box::new(client.clone()));

        let mut bad = spec();
        bad.cpu_units = 0;
        let err = automation.deploy(&bad).await.unwrap_err();
        assert!(matches!(err, ProviderError::Validation(ValidationError::CpuUnits(0))));
        assert!(client.calls().await.is_empty());
    }

    #[tokio::test]
    async fn alarm_uses_cloudwatch_metric() {
        let client = SandboxClient::new(ProviderName::Aws);
        let automation = AwsAutomation::new(Box::new(client.clone()));

        automation.configure_default_monitoring().await.unwrap();

        let alarm = client.alarm(AlarmSpec::NAME).await.unwrap();
        assert_eq!(alarm.namespace.as_deref(), Some("AWS/ECS"));
        assert_eq!(alarm.metric_name, "CPUUtilization");
        assert_eq!(alarm.threshold_percent, 80.0);
        assert_eq!(alarm.period_secs, 300);
        assert_eq!(alarm.evaluation_periods, 2);
        assert_eq!(alarm.statistic, Statistic::Average);
        assert_eq!(alarm.comparison, Comparison::GreaterThan);
    }

    #[tokio::test]
    async fn remote_failure_carries_provider_and_cause() {
        let client = SandboxClient::new(ProviderName::Aws);
        client.fail_on(ClientOp::ScaleUp, "throttled").await;
        let automation = AwsAutomation::new(Box::new(client.clone()));

        let decision = ScalingDecision::ScaleUp {
            sample: MetricsSample::at(90.0, 10.0, 10.0, 1000),
            threshold: 80.0,
        };
        let err = automation.apply(&decision).await.unwrap_err();
        match err {
            ProviderError::Api { provider, operation, source } => {
                assert_eq!(provider, ProviderName::Aws);
                assert_eq!(operation, "scale_up");
                assert_eq!(source.to_string(), "throttled");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn noop_makes_no_remote_call() {
        let client = SandboxClient::new(ProviderName::Aws);
        let automation = AwsAutomation::new(Box::new(client.clone()));

        let decision = ScalingDecision::NoOp {
            sample: MetricsSample::at(60.0, 10.0, 10.0, 1000),
            threshold: 80.0,
        };
        automation.apply(&decision).await.unwrap();
        assert!(client.calls().await.is_empty());
    }
}

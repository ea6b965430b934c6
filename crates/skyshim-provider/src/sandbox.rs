//! In-memory provider client.
//!
//! `SandboxClient` keeps a fake fleet in memory, records every primitive
//! call, and can be told to fail or stall on a given operation. The CLI
//! uses it for offline runs; tests use it to script provider behavior.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use skyshim_core::config::ProviderSettings;
use skyshim_core::{InstanceState, InstanceSummary, ProviderName};

use crate::client::{AlarmSpec, DeploymentArtifact, ProviderClient, ProviderFactory};

/// Connection parameter that seeds a sandbox fleet with N instances.
pub const SEED_INSTANCES_KEY: &str = "sandbox_instances";

/// Connection parameter giving the provider-native state of seeded
/// instances ("running", "deallocated", "STAGING", ...). Defaults to running.
pub const SEED_STATE_KEY: &str = "sandbox_state";

/// Primitive operations, used to target failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientOp {
    ListInstances,
    RegisterDeployment,
    PutUtilizationAlarm,
    ScaleUp,
    ScaleDown,
}

/// A recorded primitive call.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    ListInstances,
    RegisterDeployment(DeploymentArtifact),
    PutUtilizationAlarm(AlarmSpec),
    ScaleUp,
    ScaleDown,
}

#[derive(Default)]
struct SandboxState {
    instances: Vec<InstanceSummary>,
    calls: Vec<ClientCall>,
    alarms: HashMap<String, AlarmSpec>,
    revisions: HashMap<String, u32>,
    failures: HashMap<ClientOp, String>,
    delays: HashMap<ClientOp, Duration>,
    next_index: u32,
}

/// Shared handle to an in-memory fleet. Clones see the same state.
#[derive(Clone)]
pub struct SandboxClient {
    provider: ProviderName,
    state: Arc<Mutex<SandboxState>>,
}

impl SandboxClient {
    pub fn new(provider: ProviderName) -> Self {
        Self::with_instances(provider, Vec::new())
    }

    /// A client whose fleet starts with `count` running instances.
    pub fn with_running(provider: ProviderName, count: u32) -> Self {
        Self::with_seed(provider, count, InstanceState::Running)
    }

    /// A client whose fleet starts with `count` instances in `state`.
    pub fn with_seed(provider: ProviderName, count: u32, state: InstanceState) -> Self {
        let instances = (0..count)
            .map(|i| {
                InstanceSummary::new(format!("{provider}-sandbox-{i}"), "sandbox.small", state)
                    .with_tag("managed-by", "skyshim")
            })
            .collect();
        Self::with_instances(provider, instances)
    }

    /// A client whose fleet starts with exactly `instances`.
    pub fn with_instances(provider: ProviderName, instances: Vec<InstanceSummary>) -> Self {
        let state = SandboxState {
            next_index: u32::try_from(instances.len()).unwrap_or(u32::MAX),
            instances,
            ..SandboxState::default()
        };
        Self {
            provider,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Make every future `op` call fail with `message`.
    pub async fn fail_on(&self, op: ClientOp, message: impl Into<String>) {
        self.state.lock().await.failures.insert(op, message.into());
    }

    /// Make every future `op` call sleep for `delay` before answering.
    pub async fn delay_on(&self, op: ClientOp, delay: Duration) {
        self.state.lock().await.delays.insert(op, delay);
    }

    pub async fn calls(&self) -> Vec<ClientCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn instances(&self) -> Vec<InstanceSummary> {
        self.state.lock().await.instances.clone()
    }

    pub async fn alarm(&self, name: &str) -> Option<AlarmSpec> {
        self.state.lock().await.alarms.get(name).cloned()
    }

    /// Record the call, then honor any injected delay or failure.
    async fn enter(&self, op: ClientOp, call: ClientCall) -> anyhow::Result<()> {
        let (delay, failure) = {
            let mut state = self.state.lock().await;
            state.calls.push(call);
            (state.delays.get(&op).copied(), state.failures.get(&op).cloned())
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = failure {
            debug!(provider = %self.provider, ?op, "sandbox injected failure");
            bail!(message);
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for SandboxClient {
    async fn list_instances(&self) -> anyhow::Result<Vec<InstanceSummary>> {
        self.enter(ClientOp::ListInstances, ClientCall::ListInstances).await?;
        Ok(self.state.lock().await.instances.clone())
    }

    async fn register_deployment(&self, artifact: &DeploymentArtifact) -> anyhow::Result<String> {
        self.enter(
            ClientOp::RegisterDeployment,
            ClientCall::RegisterDeployment(artifact.clone()),
        )
        .await?;

        let mut state = self.state.lock().await;
        let revision = state.revisions.entry(artifact.name.clone()).or_insert(0);
        *revision += 1;
        Ok(format!("sandbox://{}/{}:{}", self.provider, artifact.name, revision))
    }

    async fn put_utilization_alarm(&self, alarm: &AlarmSpec) -> anyhow::Result<()> {
        self.enter(
            ClientOp::PutUtilizationAlarm,
            ClientCall::PutUtilizationAlarm(alarm.clone()),
        )
        .await?;
        self.state
            .lock()
            .await
            .alarms
            .insert(alarm.name.clone(), alarm.clone());
        Ok(())
    }

    async fn scale_up(&self) -> anyhow::Result<()> {
        self.enter(ClientOp::ScaleUp, ClientCall::ScaleUp).await?;
        let mut state = self.state.lock().await;
        let id = format!("{}-sandbox-{}", self.provider, state.next_index);
        state.next_index += 1;
        state.instances.push(
            InstanceSummary::new(id, "sandbox.small", InstanceState::Pending)
                .with_tag("managed-by", "skyshim"),
        );
        Ok(())
    }

    async fn scale_down(&self) -> anyhow::Result<()> {
        self.enter(ClientOp::ScaleDown, ClientCall::ScaleDown).await?;
        let mut state = self.state.lock().await;
        let victim = state
            .instances
            .iter_mut()
            .rev()
            .find(|i| matches!(i.state, InstanceState::Running | InstanceState::Pending))
            .ok_or_else(|| anyhow!("no running instance to terminate"))?;
        victim.state = InstanceState::Terminated;
        Ok(())
    }
}

/// Builds a fresh `SandboxClient` per provider.
///
/// `sandbox_instances` seeds the fleet size and `sandbox_state` the
/// provider-native state of the seeded instances.
#[derive(Debug, Default, Clone, Copy)]
pub struct SandboxFactory;

impl ProviderFactory for SandboxFactory {
    fn client(&self, settings: &ProviderSettings) -> anyhow::Result<Box<dyn ProviderClient>> {
        let seed = match settings.connection.get(SEED_INSTANCES_KEY) {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                anyhow!("{SEED_INSTANCES_KEY} must be a non-negative integer, got {raw:?}")
            })?,
            None => 0,
        };
        let state = match settings.connection.get(SEED_STATE_KEY) {
            Some(raw) => match InstanceState::from_provider_str(raw) {
                InstanceState::Unknown => {
                    bail!("{SEED_STATE_KEY} is not a recognized instance state: {raw:?}")
                }
                state => state,
            },
            None => InstanceState::Running,
        };
        Ok(Box::new(SandboxClient::with_seed(settings.name, seed, state)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::client::ArtifactKind;
    use skyshim_core::DeploymentSpec;

    fn artifact(name: &str) -> DeploymentArtifact {
        DeploymentArtifact {
            kind: ArtifactKind::TaskDefinition,
            name: name.to_string(),
            image_ref: "nginx".to_string(),
            cpu: "256".to_string(),
            memory: "512".to_string(),
            container_port: 80,
            labels: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn seeded_instances_are_listed() {
        let client = SandboxClient::with_running(ProviderName::Aws, 2);
        let instances = client.list_instances().await.unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].id, "aws-sandbox-0");
        assert!(instances.iter().all(|i| i.state == InstanceState::Running));
        assert_eq!(client.calls().await, vec![ClientCall::ListInstances]);
    }

    #[tokio::test]
    async fn registration_bumps_revision() {
        let client = SandboxClient::new(ProviderName::Gcp);
        let first = client.register_deployment(&artifact("web")).await.unwrap();
        let second = client.register_deployment(&artifact("web")).await.unwrap();
        assert_eq!(first, "sandbox://gcp/web:1");
        assert_eq!(second, "sandbox://gcp/web:2");
    }

    #[tokio::test]
    async fn injected_failure_is_returned_and_recorded() {
        let client = SandboxClient::new(ProviderName::Gcp);
        client.fail_on(ClientOp::ListInstances, "connectivity error").await;

        let err = client.list_instances().await.unwrap_err();
        assert_eq!(err.to_string(), "connectivity error");
        assert_eq!(client.calls().await, vec![ClientCall::ListInstances]);
    }

    #[tokio::test]
    async fn scale_up_then_down() {
        let client = SandboxClient::with_running(ProviderName::Azure, 1);
        client.scale_up().await.unwrap();

        let instances = client.instances().await;
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].id, "azure-sandbox-1");
        assert_eq!(instances[1].state, InstanceState::Pending);

        client.scale_down().await.unwrap();
        client.scale_down().await.unwrap();
        let instances = client.instances().await;
        assert!(instances.iter().all(|i| i.state == InstanceState::Terminated));

        assert!(client.scale_down().await.is_err());
    }

    #[tokio::test]
    async fn alarm_is_replaced_by_name() {
        let client = SandboxClient::new(ProviderName::Aws);
        let alarm = AlarmSpec::cpu_high(ProviderName::Aws, Some("AWS/ECS"), "CPUUtilization", 80.0);
        client.put_utilization_alarm(&alarm).await.unwrap();

        let mut tighter = alarm.clone();
        tighter.threshold_percent = 60.0;
        client.put_utilization_alarm(&tighter).await.unwrap();

        let stored = client.alarm(AlarmSpec::NAME).await.unwrap();
        assert_eq!(stored.threshold_percent, 60.0);
    }

    #[tokio::test]
    async fn factory_seeds_from_connection_params() {
        let settings = ProviderSettings {
            name: ProviderName::Aws,
            deployment: DeploymentSpec {
                app_name: "web".to_string(),
                image_ref: "nginx".to_string(),
                cpu_units: 256,
                memory_mib: 512,
                container_port: 80,
            },
            connection: BTreeMap::from([(SEED_INSTANCES_KEY.to_string(), "3".to_string())]),
        };
        let client = SandboxFactory.client(&settings).unwrap();
        assert_eq!(client.list_instances().await.unwrap().len(), 3);

        let mut bad = settings.clone();
        bad.connection
            .insert(SEED_INSTANCES_KEY.to_string(), "many".to_string());
        assert!(SandboxFactory.client(&bad).is_err());
    }

    #[tokio::test]
    async fn factory_maps_provider_native_seed_state() {
        let mut settings = ProviderSettings {
            name: ProviderName::Azure,
            deployment: DeploymentSpec {
                app_name: "web".to_string(),
                image_ref: "nginx".to_string(),
                cpu_units: 256,
                memory_mib: 512,
                container_port: 80,
            },
            connection: BTreeMap::from([
                (SEED_INSTANCES_KEY.to_string(), "2".to_string()),
                (SEED_STATE_KEY.to_string(), "Deallocated".to_string()),
            ]),
        };
        let client = SandboxFactory.client(&settings).unwrap();
        let instances = client.list_instances().await.unwrap();
        assert_eq!(instances.len(), 2);
        assert!(instances.iter().all(|i| i.state == InstanceState::Stopped));

        settings
            .connection
            .insert(SEED_STATE_KEY.to_string(), "rebooting".to_string());
        let err = SandboxFactory.client(&settings).err().unwrap();
        assert!(err.to_string().contains("rebooting"));
    }

    #[tokio::test]
    async fn explicit_fleet_is_seeded_and_extended() {
        let client = SandboxClient::with_instances(
            ProviderName::Aws,
            vec![
                InstanceSummary::new("i-0a1", "t3.micro", InstanceState::Running),
                InstanceSummary::new("i-0b2", "t3.micro", InstanceState::Stopped),
            ],
        );
        assert_eq!(client.instances().await.len(), 2);

        client.scale_up().await.unwrap();
        let instances = client.instances().await;
        assert_eq!(instances.len(), 3);
        assert_eq!(instances[2].id, "aws-sandbox-2");
    }
}

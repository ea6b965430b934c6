//! Orchestrator — fans logical operations out across providers.
//!
//! Construction is the only configuration step: once built, the set of
//! providers is fixed for the orchestrator's lifetime.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use skyshim_autoscale::ScalingPolicy;
use skyshim_core::config::{SkyshimConfig, DEFAULT_CPU_THRESHOLD};
use skyshim_core::{
    ConfigError, DeployResult, DeploymentSpec, InstanceSummary, MetricsSample, ProviderName,
    ScalingDecision,
};
use skyshim_provider::{automation_for, ProviderAutomation, ProviderFactory};

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::report::{AggregatedStatus, DeployOutcome, ProviderStatus};

/// One configured provider.
struct ProviderSlot {
    name: ProviderName,
    automation: Arc<dyn ProviderAutomation>,
    /// What `deploy_all` deploys on this provider.
    deployment: DeploymentSpec,
}

/// Collects providers before the orchestrator becomes ready.
pub struct OrchestratorBuilder {
    slots: Vec<ProviderSlot>,
    cpu_threshold: f64,
    timeout: Option<Duration>,
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
            timeout: None,
        }
    }

    /// Register a provider. Fan-out order follows registration order.
    pub fn provider(
        mut self,
        automation: Arc<dyn ProviderAutomation>,
        deployment: DeploymentSpec,
    ) -> Self {
        self.slots.push(ProviderSlot {
            name: automation.provider(),
            automation,
            deployment,
        });
        self
    }

    /// Alarm threshold used by `deploy_all`.
    pub fn cpu_threshold(mut self, threshold: f64) -> Self {
        self.cpu_threshold = threshold;
        self
    }

    /// Deadline for a whole fan-out.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> OrchestratorResult<Orchestrator> {
        if self.slots.is_empty() {
            return Err(ConfigError::NoProviders.into());
        }
        let mut seen = HashSet::new();
        for slot in &self.slots {
            if !seen.insert(slot.name) {
                return Err(ConfigError::DuplicateProvider(slot.name.to_string()).into());
            }
        }

        let names: Vec<&str> = self.slots.iter().map(|s| s.name.as_str()).collect();
        info!(
            providers = ?names,
            cpu_threshold = self.cpu_threshold,
            timeout = ?self.timeout,
            "orchestrator ready"
        );

        Ok(Orchestrator {
            slots: self.slots,
            cpu_threshold: self.cpu_threshold,
            timeout: self.timeout,
        })
    }
}

/// Owns one automation per configured provider.
pub struct Orchestrator {
    slots: Vec<ProviderSlot>,
    cpu_threshold: f64,
    timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Build from a config file's contents, creating one client per provider.
    ///
    /// Fails before any provider is contacted if the config is incomplete
    /// or a client cannot be built.
    pub fn from_config(
        config: &SkyshimConfig,
        factory: &dyn ProviderFactory,
    ) -> OrchestratorResult<Self> {
        let mut builder = OrchestratorBuilder::new().cpu_threshold(config.cpu_threshold()?);
        if let Some(timeout) = config.fan_out_timeout()? {
            builder = builder.timeout(timeout);
        }

        for settings in config.provider_settings()? {
            let client = factory
                .client(&settings)
                .map_err(|e| ConfigError::InvalidValue {
                    field: format!("providers.{}", settings.name),
                    reason: format!("{e:#}"),
                })?;
            builder = builder.provider(automation_for(settings.name, client), settings.deployment);
        }

        builder.build()
    }

    /// Configured providers, in declaration order.
    pub fn providers(&self) -> Vec<ProviderName> {
        self.slots.iter().map(|s| s.name).collect()
    }

    pub fn cpu_threshold(&self) -> f64 {
        self.cpu_threshold
    }

    /// Deploy on every provider, then configure its alarm.
    ///
    /// Monitoring is only attempted once that provider's deploy succeeded.
    /// Returns one outcome per provider; failures never abort siblings.
    pub async fn deploy_all(&self) -> Vec<DeployOutcome> {
        let threshold = self.cpu_threshold;
        let results = self
            .fan_out("deploy", move |slot| {
                let automation = slot.automation.clone();
                let spec = slot.deployment.clone();
                async move { deploy_then_monitor(automation, spec, threshold).await }
            })
            .await;

        let outcomes: Vec<DeployOutcome> = self
            .slots
            .iter()
            .zip(results)
            .map(|(slot, result)| DeployOutcome {
                provider: slot.name,
                result,
            })
            .collect();

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            succeeded = outcomes.len() - failed,
            failed,
            "deploy fan-out complete"
        );
        outcomes
    }

    /// List instances on every provider. Always one entry per provider.
    pub async fn status(&self) -> AggregatedStatus {
        let results = self
            .fan_out("status", |slot| {
                let automation = slot.automation.clone();
                async move { list_instances(automation).await }
            })
            .await;

        let mut status = AggregatedStatus::default();
        for (slot, result) in self.slots.iter().zip(results) {
            status.push(slot.name, ProviderStatus::from_result(result));
        }

        info!(
            providers = status.len(),
            failed = status.failed_count(),
            instances = status.total_instances(),
            "status fan-out complete"
        );
        status
    }

    /// Decide on one sample and apply the decision to one provider.
    ///
    /// Returns the decision that was applied. Touches no other provider.
    pub async fn apply_scaling(
        &self,
        provider: ProviderName,
        sample: MetricsSample,
        threshold: f64,
    ) -> OrchestratorResult<ScalingDecision> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.name == provider)
            .ok_or_else(|| {
                warn!(%provider, "scaling requested for unconfigured provider");
                OrchestratorError::UnknownProvider(provider)
            })?;

        let decision = ScalingPolicy::new(threshold).decide(sample);
        slot.automation.apply(&decision).await?;
        info!(%provider, decision = decision.label(), "scaling applied");
        Ok(decision)
    }

    /// Run `op` once per slot as its own task and collect the results in
    /// slot order. Each slot is written exactly once: with the task's
    /// result, a timeout, or the task's failure.
    async fn fan_out<T, F, Fut>(&self, operation: &'static str, op: F) -> Vec<OrchestratorResult<T>>
    where
        F: Fn(&ProviderSlot) -> Fut,
        Fut: Future<Output = OrchestratorResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        // A timeout too large for the clock is no deadline at all.
        let deadline = self
            .timeout
            .and_then(|t| Instant::now().checked_add(t).map(|at| (at, t)));

        let handles: Vec<(ProviderName, JoinHandle<OrchestratorResult<T>>)> = self
            .slots
            .iter()
            .map(|slot| {
                debug!(provider = %slot.name, operation, "dispatching");
                (slot.name, tokio::spawn(op(slot)))
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (provider, mut handle) in handles {
            let joined = match deadline {
                Some((at, timeout)) => {
                    match tokio::time::timeout_at(at, &mut handle).await {
                        Ok(joined) => joined,
                        Err(_) => {
                            handle.abort();
                            warn!(%provider, operation, ?timeout, "provider timed out");
                            results.push(Err(OrchestratorError::Timeout { provider, timeout }));
                            continue;
                        }
                    }
                }
                None => handle.await,
            };

            let result = joined.unwrap_or_else(|e| {
                Err(OrchestratorError::TaskFailed {
                    provider,
                    reason: e.to_string(),
                })
            });
            if let Err(e) = &result {
                warn!(%provider, operation, error = %e, "provider call failed");
            }
            results.push(result);
        }
        results
    }
}

async fn deploy_then_monitor(
    automation: Arc<dyn ProviderAutomation>,
    spec: DeploymentSpec,
    threshold: f64,
) -> OrchestratorResult<DeployResult> {
    let deployed = automation.deploy(&spec).await?;
    automation.configure_monitoring(threshold).await?;
    Ok(deployed)
}

async fn list_instances(
    automation: Arc<dyn ProviderAutomation>,
) -> OrchestratorResult<Vec<InstanceSummary>> {
    Ok(automation.list_instances().await?)
}

//! skyshim.toml configuration parser.
//!
//! Recognized top-level keys are `cloud_providers` (which providers to
//! activate, in fan-out order) and `infrastructure` (one deployment spec
//! per provider). `providers`, `monitoring` and `orchestrator` are
//! optional.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{DeploymentSpec, ProviderName};

/// Default CPU utilization threshold, in percent.
pub const DEFAULT_CPU_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkyshimConfig {
    pub cloud_providers: Vec<String>,
    #[serde(default)]
    pub infrastructure: BTreeMap<String, DeploymentSpec>,
    /// Opaque per-provider connection parameters (region, project, ...).
    #[serde(default)]
    pub providers: BTreeMap<String, BTreeMap<String, String>>,
    pub monitoring: Option<MonitoringConfig>,
    pub orchestrator: Option<OrchestratorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub cpu_threshold: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Deadline for a whole fan-out, e.g. "30s".
    pub timeout: Option<String>,
}

/// Everything needed to build one provider's automation.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    pub name: ProviderName,
    pub deployment: DeploymentSpec,
    pub connection: BTreeMap<String, String>,
}

impl SkyshimConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a config document.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: SkyshimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check everything that can be checked without talking to a provider.
    pub fn validate(&self) -> ConfigResult<()> {
        let settings = self.provider_settings()?;

        let active: HashSet<&str> = settings.iter().map(|s| s.name.as_str()).collect();
        for key in self.infrastructure.keys().chain(self.providers.keys()) {
            let known = key
                .parse::<ProviderName>()
                .map(|name| active.contains(name.as_str()))
                .unwrap_or(false);
            if !known {
                warn!(provider = %key, "ignoring config section for inactive provider");
            }
        }

        self.cpu_threshold()?;
        self.fan_out_timeout()?;
        Ok(())
    }

    /// Resolve the active providers, in declaration order.
    pub fn provider_settings(&self) -> ConfigResult<Vec<ProviderSettings>> {
        if self.cloud_providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }

        let mut seen = HashSet::new();
        let mut settings = Vec::with_capacity(self.cloud_providers.len());
        for raw in &self.cloud_providers {
            let name: ProviderName = raw.parse()?;
            if !seen.insert(name) {
                return Err(ConfigError::DuplicateProvider(name.to_string()));
            }

            let deployment = lookup(&self.infrastructure, name)
                .cloned()
                .ok_or_else(|| ConfigError::MissingInfrastructure(name.to_string()))?;
            let connection = lookup(&self.providers, name).cloned().unwrap_or_default();

            settings.push(ProviderSettings {
                name,
                deployment,
                connection,
            });
        }
        Ok(settings)
    }

    /// CPU threshold for alarms and scaling, defaulting to 80%.
    pub fn cpu_threshold(&self) -> ConfigResult<f64> {
        let threshold = self
            .monitoring
            .as_ref()
            .and_then(|m| m.cpu_threshold)
            .unwrap_or(DEFAULT_CPU_THRESHOLD);
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "monitoring.cpu_threshold".to_string(),
                reason: format!("must be a positive number, got {threshold}"),
            });
        }
        Ok(threshold)
    }

    /// Fan-out deadline, if one is configured.
    pub fn fan_out_timeout(&self) -> ConfigResult<Option<Duration>> {
        match self.orchestrator.as_ref().and_then(|o| o.timeout.as_deref()) {
            Some(raw) => parse_duration(raw)
                .map(Some)
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "orchestrator.timeout".to_string(),
                    reason: format!("expected a duration like \"30s\", got {raw:?}"),
                }),
            None => Ok(None),
        }
    }

    /// Scaffold an example config covering all three providers.
    pub fn scaffold(app_name: &str, image_ref: &str) -> Self {
        let spec = DeploymentSpec {
            app_name: app_name.to_string(),
            image_ref: image_ref.to_string(),
            cpu_units: 256,
            memory_mib: 512,
            container_port: 80,
        };

        let infrastructure = ProviderName::ALL
            .iter()
            .map(|name| (name.to_string(), spec.clone()))
            .collect();

        let mut providers = BTreeMap::new();
        providers.insert(
            "aws".to_string(),
            BTreeMap::from([("region".to_string(), "us-east-1".to_string())]),
        );
        providers.insert(
            "gcp".to_string(),
            BTreeMap::from([
                ("project".to_string(), "my-project".to_string()),
                ("region".to_string(), "us-central1".to_string()),
            ]),
        );
        providers.insert(
            "azure".to_string(),
            BTreeMap::from([
                ("resource_group".to_string(), "my-rg".to_string()),
                ("location".to_string(), "eastus".to_string()),
            ]),
        );

        SkyshimConfig {
            cloud_providers: ProviderName::ALL.iter().map(|n| n.to_string()).collect(),
            infrastructure,
            providers,
            monitoring: Some(MonitoringConfig {
                cpu_threshold: Some(DEFAULT_CPU_THRESHOLD),
            }),
            orchestrator: Some(OrchestratorConfig {
                timeout: Some("30s".to_string()),
            }),
        }
    }
}

/// Find a provider-keyed table entry, accepting any key casing.
fn lookup<V>(map: &BTreeMap<String, V>, name: ProviderName) -> Option<&V> {
    map.iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name.as_str()))
        .map(|(_, value)| value)
}

/// Parse a duration string like "500ms", "30s", "5m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(ms) = s.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.trim()
            .parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

//! Domain types shared across skyshim crates.
//!
//! All types are plain immutable values. Snapshots produced by a provider
//! listing are never mutated; the next listing supersedes them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

// ── Providers ──────────────────────────────────────────────────────

/// A supported cloud provider. Used as the aggregation key everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Aws,
    Gcp,
    Azure,
}

impl ProviderName {
    pub const ALL: [ProviderName; 3] = [ProviderName::Aws, ProviderName::Gcp, ProviderName::Azure];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Aws => "aws",
            ProviderName::Gcp => "gcp",
            ProviderName::Azure => "azure",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ProviderName {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aws" => Ok(ProviderName::Aws),
            "gcp" => Ok(ProviderName::Gcp),
            "azure" => Ok(ProviderName::Azure),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

// ── Instances ─────────────────────────────────────────────────────

/// Lifecycle state of a compute instance, normalized across providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Running,
    Stopped,
    Pending,
    Terminated,
    #[default]
    Unknown,
}

impl InstanceState {
    /// Map a provider-native state string onto the normalized set.
    ///
    /// Unrecognized strings map to `Unknown` rather than failing, so one
    /// exotic instance never fails a whole listing.
    pub fn from_provider_str(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" | "succeeded" => InstanceState::Running,
            "stopped" | "stopping" | "suspended" | "deallocated" | "deallocating" => {
                InstanceState::Stopped
            }
            "pending" | "provisioning" | "staging" | "starting" | "creating" => {
                InstanceState::Pending
            }
            "terminated" | "shutting-down" | "deleting" | "deleted" => InstanceState::Terminated,
            _ => InstanceState::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InstanceState::Running => "running",
            InstanceState::Stopped => "stopped",
            InstanceState::Pending => "pending",
            InstanceState::Terminated => "terminated",
            InstanceState::Unknown => "unknown",
        }
    }
}

/// Read-only snapshot of one instance as reported by a provider listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    /// Provider-unique instance identifier.
    pub id: String,
    pub instance_type: String,
    pub state: InstanceState,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl InstanceSummary {
    pub fn new(id: impl Into<String>, instance_type: impl Into<String>, state: InstanceState) -> Self {
        Self {
            id: id.into(),
            instance_type: instance_type.into(),
            state,
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

// ── Deployments ───────────────────────────────────────────────────

/// Description of a containerized application to run on a provider.
///
/// Parsed from configuration as-is; invariants are checked by
/// [`DeploymentSpec::validate`] right before a deploy, not at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub app_name: String,
    pub image_ref: String,
    pub cpu_units: u32,
    pub memory_mib: u32,
    pub container_port: u32,
}

impl DeploymentSpec {
    /// Check every field invariant, reporting the first violation.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.app_name.trim().is_empty() {
            return Err(ValidationError::EmptyAppName);
        }
        if self.image_ref.trim().is_empty() {
            return Err(ValidationError::EmptyImageRef);
        }
        if self.cpu_units == 0 {
            return Err(ValidationError::CpuUnits(self.cpu_units));
        }
        if self.memory_mib == 0 {
            return Err(ValidationError::MemoryMib(self.memory_mib));
        }
        if !(1..=65535).contains(&self.container_port) {
            return Err(ValidationError::ContainerPort(self.container_port));
        }
        Ok(())
    }
}

/// Outcome of a successful deploy on one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub app_name: String,
    /// Provider-side reference to the registered artifact (task definition
    /// ARN, service name, container group id).
    pub provider_ref: String,
    /// Unix timestamp (seconds).
    pub deployed_at: u64,
}

// ── Metrics & scaling ─────────────────────────────────────────────

/// One utilization sample from an external monitoring source.
///
/// Only `cpu_usage_percent` drives scaling; memory and disk are carried
/// for observability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSample {
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub disk_usage_percent: f64,
    /// Unix timestamp (seconds).
    pub captured_at: u64,
}

impl MetricsSample {
    /// A sample captured now.
    pub fn new(cpu: f64, memory: f64, disk: f64) -> Self {
        Self::at(cpu, memory, disk, epoch_secs())
    }

    pub fn at(cpu: f64, memory: f64, disk: f64, captured_at: u64) -> Self {
        Self {
            cpu_usage_percent: cpu,
            memory_usage_percent: memory,
            disk_usage_percent: disk,
            captured_at,
        }
    }
}

/// Scaling verdict, carrying the sample and threshold that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScalingDecision {
    ScaleUp { sample: MetricsSample, threshold: f64 },
    ScaleDown { sample: MetricsSample, threshold: f64 },
    NoOp { sample: MetricsSample, threshold: f64 },
}

impl ScalingDecision {
    pub fn sample(&self) -> &MetricsSample {
        match self {
            ScalingDecision::ScaleUp { sample, .. }
            | ScalingDecision::ScaleDown { sample, .. }
            | ScalingDecision::NoOp { sample, .. } => sample,
        }
    }

    pub fn threshold(&self) -> f64 {
        match self {
            ScalingDecision::ScaleUp { threshold, .. }
            | ScalingDecision::ScaleDown { threshold, .. }
            | ScalingDecision::NoOp { threshold, .. } => *threshold,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScalingDecision::ScaleUp { .. } => "scale_up",
            ScalingDecision::ScaleDown { .. } => "scale_down",
            ScalingDecision::NoOp { .. } => "no_op",
        }
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, ScalingDecision::NoOp { .. })
    }
}

/// Current Unix time in seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_spec() -> DeploymentSpec {
        DeploymentSpec {
            app_name: "web".to_string(),
            image_ref: "nginx:1.27".to_string(),
            cpu_units: 256,
            memory_mib: 512,
            container_port: 80,
        }
    }

    #[test]
    fn provider_name_parses_case_insensitively() {
        assert_eq!("AWS".parse::<ProviderName>().unwrap(), ProviderName::Aws);
        assert_eq!(" gcp ".parse::<ProviderName>().unwrap(), ProviderName::Gcp);
        assert_eq!("Azure".parse::<ProviderName>().unwrap(), ProviderName::Azure);
        assert!(matches!(
            "oracle".parse::<ProviderName>(),
            Err(ConfigError::UnknownProvider(name)) if name == "oracle"
        ));
    }

    #[test]
    fn provider_name_serializes_lowercase() {
        let json = serde_json::to_string(&ProviderName::Azure).unwrap();
        assert_eq!(json, "\"azure\"");
    }

    #[test]
    fn valid_spec_passes() {
        assert!(valid_spec().validate().is_ok());
    }

    #[test]
    fn spec_invariants_are_enforced() {
        let mut spec = valid_spec();
        spec.app_name = "  ".to_string();
        assert_eq!(spec.validate(), Err(ValidationError::EmptyAppName));

        let mut spec = valid_spec();
        spec.image_ref.clear();
        assert_eq!(spec.validate(), Err(ValidationError::EmptyImageRef));

        let mut spec = valid_spec();
        spec.cpu_units = 0;
        assert_eq!(spec.validate(), Err(ValidationError::CpuUnits(0)));

        let mut spec = valid_spec();
        spec.memory_mib = 0;
        assert_eq!(spec.validate(), Err(ValidationError::MemoryMib(0)));

        let mut spec = valid_spec();
        spec.container_port = 0;
        assert_eq!(spec.validate(), Err(ValidationError::ContainerPort(0)));
        spec.container_port = 65536;
        assert_eq!(spec.validate(), Err(ValidationError::ContainerPort(65536)));
        spec.container_port = 65535;
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn instance_state_from_provider_strings() {
        assert_eq!(InstanceState::from_provider_str("RUNNING"), InstanceState::Running);
        assert_eq!(InstanceState::from_provider_str("deallocated"), InstanceState::Stopped);
        assert_eq!(InstanceState::from_provider_str("STAGING"), InstanceState::Pending);
        assert_eq!(InstanceState::from_provider_str("shutting-down"), InstanceState::Terminated);
        assert_eq!(InstanceState::from_provider_str("rebooting"), InstanceState::Unknown);
    }

    #[test]
    fn instance_summary_json_shape() {
        let inst = InstanceSummary::new("i-123", "t3.micro", InstanceState::Running)
            .with_tag("env", "prod");
        let value = serde_json::to_value(&inst).unwrap();
        assert_eq!(value["id"], "i-123");
        assert_eq!(value["instanceType"], "t3.micro");
        assert_eq!(value["state"], "running");
        assert_eq!(value["tags"]["env"], "prod");
    }

    #[test]
    fn decision_accessors() {
        let sample = MetricsSample::at(85.0, 40.0, 10.0, 1000);
        let decision = ScalingDecision::ScaleUp { sample, threshold: 80.0 };
        assert_eq!(decision.sample().captured_at, 1000);
        assert_eq!(decision.threshold(), 80.0);
        assert_eq!(decision.label(), "scale_up");
        assert!(!decision.is_noop());

        let value = serde_json::to_value(decision).unwrap();
        assert_eq!(value["action"], "scale_up");
        assert_eq!(value["sample"]["cpuUsagePercent"], 85.0);
    }
}

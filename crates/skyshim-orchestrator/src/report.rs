//! Aggregated, serializable results of a fan-out.
//!
//! Both reports keep one entry per configured provider, in declaration
//! order, and serialize as a JSON object keyed by provider name:
//!
//! ```text
//! {"aws": {"instanceCount": 2, "instances": [...], "error": null},
//!  "gcp": {"instanceCount": 0, "instances": [],    "error": {"kind": "provider_api", ...}}}
//! ```

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;

use skyshim_core::{DeployResult, InstanceState, InstanceSummary, ProviderName};

use crate::error::{ErrorKind, OrchestratorError, OrchestratorResult};

/// Serializable view of an error: its kind and rendered message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&OrchestratorError> for ErrorInfo {
    fn from(err: &OrchestratorError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

// ── Status ────────────────────────────────────────────────────────

/// One provider's slice of a status query.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub instance_count: usize,
    pub instances: Vec<InstanceSummary>,
    pub error: Option<ErrorInfo>,
}

impl ProviderStatus {
    pub(crate) fn from_result(result: OrchestratorResult<Vec<InstanceSummary>>) -> Self {
        match result {
            Ok(instances) => Self {
                instance_count: instances.len(),
                instances,
                error: None,
            },
            Err(e) => Self {
                instance_count: 0,
                instances: Vec::new(),
                error: Some(ErrorInfo::from(&e)),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn count_in_state(&self, state: InstanceState) -> usize {
        self.instances.iter().filter(|i| i.state == state).count()
    }
}

/// Status of every configured provider. Never drops a provider.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AggregatedStatus {
    entries: Vec<(ProviderName, ProviderStatus)>,
}

impl AggregatedStatus {
    pub(crate) fn push(&mut self, provider: ProviderName, status: ProviderStatus) {
        self.entries.push((provider, status));
    }

    pub fn get(&self, provider: ProviderName) -> Option<&ProviderStatus> {
        self.entries
            .iter()
            .find(|(name, _)| *name == provider)
            .map(|(_, status)| status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderName, &ProviderStatus)> {
        self.entries.iter().map(|(name, status)| (*name, status))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of providers whose entry carries an error.
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|(_, s)| !s.is_ok()).count()
    }

    pub fn total_instances(&self) -> usize {
        self.entries.iter().map(|(_, s)| s.instance_count).sum()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for AggregatedStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (provider, status) in &self.entries {
            map.serialize_entry(provider.as_str(), status)?;
        }
        map.end()
    }
}

// ── Deploy ────────────────────────────────────────────────────────

/// Result of one provider's deploy + monitoring sequence.
#[derive(Debug)]
pub struct DeployOutcome {
    pub provider: ProviderName,
    pub result: OrchestratorResult<DeployResult>,
}

impl DeployOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Serializable summary of a `deploy_all` pass.
#[derive(Debug, Clone, PartialEq, serde::Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployEntry {
    pub deployment: Option<DeployResult>,
    pub error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeployReport {
    entries: Vec<(ProviderName, DeployEntry)>,
}

impl DeployReport {
    pub fn from_outcomes(outcomes: &[DeployOutcome]) -> Self {
        let entries = outcomes
            .iter()
            .map(|outcome| {
                let entry = match &outcome.result {
                    Ok(deployed) => DeployEntry {
                        deployment: Some(deployed.clone()),
                        error: None,
                    },
                    Err(e) => DeployEntry {
                        deployment: None,
                        error: Some(ErrorInfo::from(e)),
                    },
                };
                (outcome.provider, entry)
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, provider: ProviderName) -> Option<&DeployEntry> {
        self.entries
            .iter()
            .find(|(name, _)| *name == provider)
            .map(|(_, entry)| entry)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProviderName, &DeployEntry)> {
        self.entries.iter().map(|(name, entry)| (*name, entry))
    }

    pub fn succeeded_count(&self) -> usize {
        self.entries.iter().filter(|(_, e)| e.error.is_none()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.succeeded_count()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for DeployReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (provider, entry) in &self.entries {
            map.serialize_entry(provider.as_str(), entry)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use skyshim_core::ValidationError;
    use skyshim_provider::ProviderError;

    fn running(id: &str) -> InstanceSummary {
        InstanceSummary::new(id, "t3.micro", InstanceState::Running)
    }

    fn connectivity_error() -> OrchestratorError {
        OrchestratorError::Provider(ProviderError::Api {
            provider: ProviderName::Gcp,
            operation: "list_instances",
            source: anyhow!("connectivity error"),
        })
    }

    #[test]
    fn status_serializes_in_declaration_order_with_null_errors() {
        let mut status = AggregatedStatus::default();
        status.push(
            ProviderName::Gcp,
            ProviderStatus::from_result(Err(connectivity_error())),
        );
        status.push(
            ProviderName::Aws,
            ProviderStatus::from_result(Ok(vec![running("i-1"), running("i-2")])),
        );

        let json = status.to_json_pretty().unwrap();
        assert!(json.find("\"gcp\"").unwrap() < json.find("\"aws\"").unwrap());

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["aws"]["instanceCount"], 2);
        assert_eq!(value["aws"]["instances"][0]["id"], "i-1");
        assert!(value["aws"]["error"].is_null());
        assert_eq!(value["gcp"]["instanceCount"], 0);
        assert_eq!(value["gcp"]["instances"].as_array().unwrap().len(), 0);
        assert_eq!(value["gcp"]["error"]["kind"], "provider_api");
        assert!(value["gcp"]["error"]["message"]
            .as_str()
            .unwrap()
            .contains("connectivity error"));

        assert_eq!(status.len(), 2);
        assert_eq!(status.failed_count(), 1);
        assert_eq!(status.total_instances(), 2);
        assert_eq!(
            status.get(ProviderName::Aws).unwrap().count_in_state(InstanceState::Running),
            2
        );
    }

    #[test]
    fn deploy_report_separates_success_and_failure() {
        let outcomes = vec![
            DeployOutcome {
                provider: ProviderName::Aws,
                result: Ok(DeployResult {
                    app_name: "web".to_string(),
                    provider_ref: "sandbox://aws/web:1".to_string(),
                    deployed_at: 1000,
                }),
            },
            DeployOutcome {
                provider: ProviderName::Azure,
                result: Err(OrchestratorError::Provider(ProviderError::Validation(
                    ValidationError::CpuUnits(0),
                ))),
            },
        ];

        let report = DeployReport::from_outcomes(&outcomes);
        assert_eq!(report.succeeded_count(), 1);
        assert_eq!(report.failed_count(), 1);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["aws"]["deployment"]["providerRef"], "sandbox://aws/web:1");
        assert!(value["aws"]["error"].is_null());
        assert!(value["azure"]["deployment"].is_null());
        assert_eq!(value["azure"]["error"]["kind"], "validation");
    }
}

//! skyshim-orchestrator — one logical operation, every configured provider.
//!
//! The `Orchestrator` owns one `ProviderAutomation` per configured provider,
//! built once at construction. Deploy and status fan out one task per
//! provider; every provider gets exactly one result slot, and a failure in
//! one slot never aborts its siblings.
//!
//! # Architecture
//!
//! ```text
//! SkyshimConfig ──► OrchestratorBuilder ──► Orchestrator
//!                     (ProviderFactory)       ├── slot: aws   ─► Arc<dyn ProviderAutomation>
//!                                             ├── slot: gcp   ─► Arc<dyn ProviderAutomation>
//!                                             └── slot: azure ─► Arc<dyn ProviderAutomation>
//!
//! deploy_all():    per slot: deploy ─► configure_monitoring   → Vec<DeployOutcome>
//! status():        per slot: list_instances                   → AggregatedStatus
//! apply_scaling(): one slot: ScalingPolicy::decide ─► apply   → ScalingDecision
//! ```
//!
//! An optional fan-out deadline turns unfinished slots into `Timeout`
//! errors instead of leaving them empty.

pub mod error;
pub mod orchestrator;
pub mod report;

pub use error::{ErrorKind, OrchestratorError, OrchestratorResult};
pub use orchestrator::{Orchestrator, OrchestratorBuilder};
pub use report::{
    AggregatedStatus, DeployEntry, DeployOutcome, DeployReport, ErrorInfo, ProviderStatus,
};

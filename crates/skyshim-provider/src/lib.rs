//! skyshim-provider — the provider automation layer.
//!
//! Each cloud provider gets one [`ProviderAutomation`] variant wrapping a
//! single [`ProviderClient`] handle. The variant is picked once, when the
//! automation is built, so callers never branch on provider identity.
//!
//! # Architecture
//!
//! ```text
//! ProviderAutomation (trait object)
//!   ├── AwsAutomation    ─┐
//!   ├── GcpAutomation    ─┼── AutomationCore ── Box<dyn ProviderClient>
//!   └── AzureAutomation  ─┘
//!
//! ProviderFactory: (ProviderSettings) → Box<dyn ProviderClient>
//!   └── SandboxFactory → SandboxClient (in-memory, failure injection)
//! ```
//!
//! Scale actions are fire-and-forget: an automation reports whether the
//! remote call was accepted, never whether the fleet converged.

pub mod automation;
pub mod aws;
pub mod azure;
pub mod client;
pub mod error;
pub mod gcp;
pub mod sandbox;

pub use automation::{automation_for, ProviderAutomation};
pub use aws::AwsAutomation;
pub use azure::AzureAutomation;
pub use client::{
    AlarmSpec, ArtifactKind, Comparison, DeploymentArtifact, ProviderClient, ProviderFactory,
    Statistic,
};
pub use error::{ProviderError, ProviderResult};
pub use gcp::GcpAutomation;
pub use sandbox::{
    ClientCall, ClientOp, SandboxClient, SandboxFactory, SEED_INSTANCES_KEY, SEED_STATE_KEY,
};

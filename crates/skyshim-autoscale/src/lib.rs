//! skyshim-autoscale — reactive scaling policy.
//!
//! Turns one `MetricsSample` into a `ScalingDecision`. The policy is a
//! pure function; carrying the decision out is the provider automation's
//! job.
//!
//! # Scaling Algorithm
//!
//! ```text
//! cpu = sample.cpu_usage_percent
//!
//! if cpu > threshold:       ScaleUp
//! if cpu < threshold / 2:   ScaleDown
//! otherwise:                NoOp        // dead zone
//! ```
//!
//! Both boundaries (`cpu == threshold`, `cpu == threshold / 2`) fall in
//! the dead zone. Memory and disk usage are carried in the sample but do
//! not influence the decision.

pub mod policy;

pub use policy::{decide, ScalingPolicy};

//! Threshold policy with a dead zone between `threshold / 2` and `threshold`.

use tracing::debug;

use skyshim_core::config::DEFAULT_CPU_THRESHOLD;
use skyshim_core::{MetricsSample, ScalingDecision};

/// Decide how to scale for one sample.
///
/// A NaN CPU reading compares false both ways and lands in `NoOp`.
pub fn decide(sample: MetricsSample, threshold: f64) -> ScalingDecision {
    let cpu = sample.cpu_usage_percent;

    let decision = if cpu > threshold {
        ScalingDecision::ScaleUp { sample, threshold }
    } else if cpu < threshold / 2.0 {
        ScalingDecision::ScaleDown { sample, threshold }
    } else {
        ScalingDecision::NoOp { sample, threshold }
    };

    debug!(
        cpu,
        memory = sample.memory_usage_percent,
        disk = sample.disk_usage_percent,
        threshold,
        decision = decision.label(),
        "scaling decision"
    );
    decision
}

/// A `decide` bound to a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingPolicy {
    threshold: f64,
}

impl ScalingPolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn decide(&self, sample: MetricsSample) -> ScalingDecision {
        decide(sample, self.threshold)
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CPU_THRESHOLD)
    }
}

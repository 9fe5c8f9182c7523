//! Benchmark result types.
//!
//! The result record binds performance metrics to correctness verification:
//! a result is only usable as certification evidence when no hard fault is
//! set and every output matched.

use serde::{Deserialize, Serialize};

use crate::faults::FaultFlags;
use crate::hash::Digest;
use crate::platform::env::EnvStats;
use crate::platform::hwcounters::HwCounters;
use crate::stats::Histogram;

/// Latency statistics, all in integer nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyStats {
    /// Minimum observed latency.
    pub min_ns: u64,
    /// Maximum observed latency.
    pub max_ns: u64,
    /// Arithmetic mean.
    pub mean_ns: u64,
    /// 50th percentile.
    pub median_ns: u64,
    /// 95th percentile.
    pub p95_ns: u64,
    /// 99th percentile.
    pub p99_ns: u64,
    /// Sample variance in ns².
    pub variance_ns2: u64,
    /// Integer square root of the variance.
    pub stddev_ns: u64,
    /// Number of samples.
    pub sample_count: u32,
    /// Samples above `mean + 3 * stddev`.
    pub outlier_count: u32,
    /// Maximum observed latency (equal to `max_ns`).
    pub wcet_observed_ns: u64,
    /// Empirical worst-case bound: `max + 6 * stddev`.
    pub wcet_bound_ns: u64,
}

/// Throughput metrics. All integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Throughput {
    /// Complete inferences per second.
    pub inferences_per_sec: u64,
    /// `inferences_per_sec * batch_size`.
    pub samples_per_sec: u64,
    /// Estimated output bandwidth: `inferences_per_sec * output_size`.
    pub bytes_per_sec: u64,
    /// Batch size used.
    pub batch_size: u32,
}

/// Complete result of one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchResult {
    /// Schema version of this record.
    pub version: String,

    /// Architecture tag: `x86_64`, `aarch64`, `riscv64`, ...
    pub platform: String,
    /// CPU identification string; empty when the probe failed.
    pub cpu_model: String,
    /// Nominal CPU frequency in MHz; 0 when unavailable.
    pub cpu_freq_mhz: u32,
    /// Timer backend that produced the samples.
    pub timer_name: String,

    /// Echo of the configured warmup iteration count.
    pub warmup_iterations: u32,
    /// Echo of the configured measured iteration count.
    pub measure_iterations: u32,
    /// Echo of the configured batch size.
    pub batch_size: u32,

    /// Latency statistics over the measured samples.
    pub latency: LatencyStats,
    /// Throughput derived from the summed sample latencies.
    pub throughput: Throughput,

    /// Hardware counter snapshot, when the platform provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hwcounters: Option<HwCounters>,

    /// Environmental statistics over the run.
    pub environment: EnvStats,
    /// Outcome of the stability predicate over `environment`.
    pub env_stable: bool,

    /// Latency histogram, when collection was enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub histogram: Option<Histogram>,

    /// All outputs were produced without an inference failure or golden
    /// mismatch.
    pub determinism_verified: bool,
    /// Count of failed iterations and golden mismatches.
    pub verification_failures: u32,
    /// SHA-256 over the concatenated per-iteration outputs in issue order.
    pub output_hash: Digest,
    /// Result-binding digest committing to the output hash, platform, key
    /// latency metrics, and timestamp.
    pub result_hash: Digest,

    /// Monotonic timestamp at measurement start.
    pub benchmark_start_ns: u64,
    /// Monotonic timestamp at result assembly.
    pub benchmark_end_ns: u64,
    /// `benchmark_end_ns - benchmark_start_ns`.
    pub benchmark_duration_ns: u64,
    /// Wall-clock Unix timestamp at result assembly, in seconds.
    pub timestamp_unix: u64,

    /// Sticky fault flags accumulated over the run.
    pub faults: FaultFlags,
}

impl BenchResult {
    /// True iff this result may be used as certification evidence: no hard
    /// fault and zero verification failures.
    pub fn is_valid(&self) -> bool {
        !self.faults.has_hard_fault() && self.verification_failures == 0
    }
}

impl Default for BenchResult {
    fn default() -> Self {
        Self {
            version: crate::RESULT_SCHEMA_VERSION.to_string(),
            platform: String::new(),
            cpu_model: String::new(),
            cpu_freq_mhz: 0,
            timer_name: String::new(),
            warmup_iterations: 0,
            measure_iterations: 0,
            batch_size: 0,
            latency: LatencyStats::default(),
            throughput: Throughput::default(),
            hwcounters: None,
            environment: EnvStats::default(),
            env_stable: true,
            histogram: None,
            determinism_verified: false,
            verification_failures: 0,
            output_hash: Digest::default(),
            result_hash: Digest::default(),
            benchmark_start_ns: 0,
            benchmark_end_ns: 0,
            benchmark_duration_ns: 0,
            timestamp_unix: 0,
            faults: FaultFlags::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let r = BenchResult::default();
        assert!(r.is_valid());
    }

    #[test]
    fn test_hard_fault_invalidates() {
        let mut r = BenchResult::default();
        r.faults.timer_error = true;
        assert!(!r.is_valid());
    }

    #[test]
    fn test_verification_failure_invalidates() {
        let mut r = BenchResult::default();
        r.verification_failures = 1;
        assert!(!r.is_valid());
    }

    #[test]
    fn test_thermal_drift_does_not_invalidate() {
        let mut r = BenchResult::default();
        r.faults.thermal_drift = true;
        assert!(r.is_valid());
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut r = BenchResult::default();
        r.platform = "x86_64".to_string();
        r.latency.p99_ns = 123_456;
        r.throughput.inferences_per_sec = 9_000;
        r.output_hash = crate::hash::sha256(b"outputs");

        let json = serde_json::to_string(&r).unwrap();
        let back: BenchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.platform, "x86_64");
        assert_eq!(back.latency.p99_ns, 123_456);
        assert_eq!(back.output_hash, r.output_hash);
    }

    #[test]
    fn test_serialisation_is_deterministic() {
        let r = BenchResult::default();
        let a = serde_json::to_string(&r).unwrap();
        let b = serde_json::to_string(&r).unwrap();
        assert_eq!(a, b);
    }
}

//! Cross-platform comparison gated on bit-identity.
//!
//! Two results may only be compared for performance when they produced
//! byte-identical outputs, witnessed by equal output digests. When the
//! gate fails, every delta and ratio is zero: not computed, not displayed.
//!
//! Ratios are Q16.16 fixed point and persisted as integers. Floating point
//! appears only in [`format_ratio_q16`], at the presentation boundary.

use serde::{Deserialize, Serialize};

use crate::hash::{Digest, Sha256};
use crate::result::{BenchResult, LatencyStats};

/// Domain-separation prefix for the result-binding digest.
const RESULT_BINDING_PREFIX: &[u8; 12] = b"CB:RESULT:v1";

/// Platform tag length inside the binding digest, NUL-padded.
const BINDING_PLATFORM_LEN: usize = 32;

/// Outcome of comparing benchmark results from two runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    /// Platform tag of the reference run.
    pub platform_a: String,
    /// Platform tag of the target run.
    pub platform_b: String,

    /// The two output digests were equal.
    pub outputs_identical: bool,
    /// Performance fields below are meaningful.
    pub comparable: bool,

    /// `B.p99 - A.p99` in nanoseconds; positive means B is slower.
    pub latency_diff_ns: i64,
    /// `B.p99 / A.p99` in Q16.16; 0 when `A.p99` is zero.
    pub latency_ratio_q16: u32,

    /// `B - A` in inferences per second.
    pub throughput_diff: i64,
    /// `B / A` in Q16.16; 0 when A's throughput is zero.
    pub throughput_ratio_q16: u32,

    /// `B.wcet_bound - A.wcet_bound` in nanoseconds.
    pub wcet_diff_ns: i64,
    /// `B.wcet_bound / A.wcet_bound` in Q16.16; 0 when A's bound is zero.
    pub wcet_ratio_q16: u32,
}

/// Compare two benchmark results.
///
/// Works on invalid results too; the gate alone decides whether the
/// performance fields are populated.
pub fn compare_results(a: &BenchResult, b: &BenchResult) -> Comparison {
    let outputs_identical = a.output_hash.ct_eq(&b.output_hash);

    let mut cmp = Comparison {
        platform_a: a.platform.clone(),
        platform_b: b.platform.clone(),
        outputs_identical,
        comparable: outputs_identical,
        latency_diff_ns: 0,
        latency_ratio_q16: 0,
        throughput_diff: 0,
        throughput_ratio_q16: 0,
        wcet_diff_ns: 0,
        wcet_ratio_q16: 0,
    };

    if !cmp.comparable {
        return cmp;
    }

    cmp.latency_diff_ns = b.latency.p99_ns as i64 - a.latency.p99_ns as i64;
    cmp.latency_ratio_q16 = ratio_q16(b.latency.p99_ns, a.latency.p99_ns);

    cmp.throughput_diff =
        b.throughput.inferences_per_sec as i64 - a.throughput.inferences_per_sec as i64;
    cmp.throughput_ratio_q16 = ratio_q16(
        b.throughput.inferences_per_sec,
        a.throughput.inferences_per_sec,
    );

    cmp.wcet_diff_ns = b.latency.wcet_bound_ns as i64 - a.latency.wcet_bound_ns as i64;
    cmp.wcet_ratio_q16 = ratio_q16(b.latency.wcet_bound_ns, a.latency.wcet_bound_ns);

    cmp
}

/// `(numerator << 16) / denominator` in Q16.16.
///
/// A zero denominator collapses to 0 rather than trapping; a ratio beyond
/// the u32 range saturates.
pub fn ratio_q16(numerator: u64, denominator: u64) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (((numerator as u128) << 16) / denominator as u128).min(u32::MAX as u128) as u32
}

/// Render a Q16.16 ratio as `N.NNx` for human display.
///
/// The only place a ratio meets floating point; decisions never do.
pub fn format_ratio_q16(ratio: u32) -> String {
    format!("{:.2}x", ratio as f64 / 65536.0)
}

/// Compute the result-binding digest.
///
/// A single SHA-256 over the fixed byte sequence
/// `"CB:RESULT:v1" ‖ output_hash ‖ platform (NUL-padded to 32 bytes) ‖
/// LE64(config_hash) ‖ LE64(min) ‖ LE64(max) ‖ LE64(mean) ‖ LE64(p99) ‖
/// LE64(timestamp_unix)`. Deterministic given identical inputs; any
/// differing field yields a different digest.
pub fn result_binding_digest(
    output_hash: &Digest,
    platform: &str,
    config_hash: u64,
    stats: &LatencyStats,
    timestamp_unix: u64,
) -> Digest {
    let mut ctx = Sha256::new();
    // A fresh context accepts every update.
    let _ = ctx.update(RESULT_BINDING_PREFIX);
    let _ = ctx.update(&output_hash.0);

    let mut platform_padded = [0u8; BINDING_PLATFORM_LEN];
    let bytes = platform.as_bytes();
    let len = bytes.len().min(BINDING_PLATFORM_LEN);
    platform_padded[..len].copy_from_slice(&bytes[..len]);
    let _ = ctx.update(&platform_padded);

    for value in [
        config_hash,
        stats.min_ns,
        stats.max_ns,
        stats.mean_ns,
        stats.p99_ns,
        timestamp_unix,
    ] {
        let _ = ctx.update(&value.to_le_bytes());
    }

    ctx.finalize()
}

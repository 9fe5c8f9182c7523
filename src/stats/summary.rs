//! Single-pass summary statistics and the empirical WCET bound.

use crate::error::Error;
use crate::faults::FaultFlags;
use crate::result::LatencyStats;

use super::isqrt::isqrt64;
use super::percentile::percentile;
use super::sort::sort_u64;

/// Sigma multiplier for the empirical WCET bound.
const WCET_SIGMA: u64 = 6;

/// Compute the full latency statistics for a sample buffer.
///
/// The buffer is sorted in place for the percentile pass; callers that need
/// issue order must copy first. Sticky faults are recorded in `faults`:
///
/// - `n == 0` sets `div_zero` and returns an error with stats untouched;
/// - sum-accumulator saturation sets `overflow` and falls back to Welford's
///   running mean — the stats are still fully populated and returned;
/// - WCET bound overflow sets `overflow` and reports `wcet_bound = max`.
///
/// The inline `outlier_count` uses the `mean + 3 * stddev` threshold; the
/// MAD-based detector in [`detect_outliers`] is a separate, stricter
/// criterion and the two are intentionally not interchangeable.
///
/// [`detect_outliers`]: super::detect_outliers
pub fn compute_stats(samples: &mut [u64], faults: &mut FaultFlags) -> Result<LatencyStats, Error> {
    let count = samples.len();
    if count == 0 {
        faults.div_zero = true;
        return Err(Error::InvalidConfig("cannot compute statistics of zero samples"));
    }

    let mut sum = 0u64;
    let mut overflowed = false;
    let mut min_val = samples[0];
    let mut max_val = samples[0];

    // Welford running moments, kept alongside the plain sum so the mean
    // survives accumulator saturation.
    let mut m: i64 = 0;
    let mut s: i64 = 0;

    for (i, &x) in samples.iter().enumerate() {
        match sum.checked_add(x) {
            Some(v) => sum = v,
            None => {
                overflowed = true;
                faults.overflow = true;
            }
        }

        if x < min_val {
            min_val = x;
        }
        if x > max_val {
            max_val = x;
        }

        let delta = (x as i64).wrapping_sub(m);
        m = m.wrapping_add(delta / (i as i64 + 1));
        let delta2 = (x as i64).wrapping_sub(m);
        s = s.wrapping_add(delta.wrapping_mul(delta2));
    }

    let mean = if overflowed { m as u64 } else { sum / count as u64 };

    let (variance, stddev) = if count > 1 {
        let variance = (s / (count as i64 - 1)) as u64;
        (variance, isqrt64(variance))
    } else {
        (0, 0)
    };

    sort_u64(samples);

    let median = percentile(samples, 50);
    let p95 = percentile(samples, 95);
    let p99 = percentile(samples, 99);

    // wcet_bound = max + 6 * stddev, saturating to max on overflow.
    let wcet_bound = if stddev <= (u64::MAX - max_val) / WCET_SIGMA {
        max_val + WCET_SIGMA * stddev
    } else {
        faults.overflow = true;
        max_val
    };

    let mut outlier_count = 0u32;
    if stddev > 0 {
        let threshold = mean.saturating_add(3 * stddev);
        outlier_count = samples.iter().filter(|&&x| x > threshold).count() as u32;
    }

    Ok(LatencyStats {
        min_ns: min_val,
        max_ns: max_val,
        mean_ns: mean,
        median_ns: median,
        p95_ns: p95,
        p99_ns: p99,
        variance_ns2: variance,
        stddev_ns: stddev,
        sample_count: count as u32,
        outlier_count,
        wcet_observed_ns: max_val,
        wcet_bound_ns: wcet_bound,
    })
}

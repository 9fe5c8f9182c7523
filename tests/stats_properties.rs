//! Property tests for the integer statistics kernel.

use certifiable_bench::stats::{
    compute_stats, detect_outliers, isqrt64, percentile, sort_u64, Histogram, OutlierScratch,
};
use certifiable_bench::FaultFlags;
use rand::{Rng, SeedableRng};

fn rng() -> rand::rngs::StdRng {
    rand::rngs::StdRng::seed_from_u64(0xbe7c)
}

/// isqrt(n)² ≤ n < (isqrt(n)+1)² over a wide sweep.
#[test]
fn isqrt_floor_invariant() {
    let mut rng = rng();
    for _ in 0..10_000 {
        let n: u64 = rng.gen();
        let r = isqrt64(n);
        assert!(r.checked_mul(r).map_or(false, |sq| sq <= n), "n={n} r={r}");
        let next = r + 1;
        match next.checked_mul(next) {
            Some(sq) => assert!(sq > n, "n={n} r={r}"),
            // (r+1)² overflowing u64 means r is the 32-bit ceiling.
            None => assert_eq!(r, 0xFFFF_FFFF),
        }
    }
}

/// min ≤ median ≤ max, min ≤ mean ≤ max, p50 ≤ p95 ≤ p99 ≤ max for random
/// sample sets of every size class.
#[test]
fn summary_ordering_invariant() {
    let mut rng = rng();
    for &n in &[1usize, 2, 3, 63, 64, 65, 1000] {
        let mut samples: Vec<u64> = (0..n).map(|_| rng.gen_range(0..10_000_000)).collect();
        let mut faults = FaultFlags::new();
        let stats = compute_stats(&mut samples, &mut faults).unwrap();

        assert!(stats.min_ns <= stats.median_ns, "n={n}");
        assert!(stats.median_ns <= stats.max_ns, "n={n}");
        assert!(stats.min_ns <= stats.mean_ns, "n={n}");
        assert!(stats.mean_ns <= stats.max_ns, "n={n}");
        assert!(stats.median_ns <= stats.p95_ns, "n={n}");
        assert!(stats.p95_ns <= stats.p99_ns, "n={n}");
        assert!(stats.p99_ns <= stats.max_ns, "n={n}");
        assert_eq!(stats.wcet_observed_ns, stats.max_ns, "n={n}");
        assert!(stats.wcet_bound_ns >= stats.max_ns, "n={n}");
        assert!(!faults.has_hard_fault(), "n={n}");
    }
}

/// Percentile scenario from the data sheet: evenly spaced quartiles.
#[test]
fn percentile_scenario() {
    let samples = [100u64, 200, 300, 400, 500];
    assert_eq!(percentile(&samples, 0), 100);
    assert_eq!(percentile(&samples, 25), 200);
    assert_eq!(percentile(&samples, 50), 300);
    assert_eq!(percentile(&samples, 75), 400);
    assert_eq!(percentile(&samples, 100), 500);
}

/// Sorting is deterministic and total regardless of input permutation.
#[test]
fn sort_determinism() {
    let mut rng = rng();
    let reference: Vec<u64> = (0..500).map(|_| rng.gen_range(0..1000)).collect();

    let mut a = reference.clone();
    sort_u64(&mut a);

    let mut b = reference;
    b.reverse();
    sort_u64(&mut b);

    assert_eq!(a, b);
    assert!(a.windows(2).all(|w| w[0] <= w[1]));
}

/// Histogram conservation: bins plus sentinels account for every sample.
#[test]
fn histogram_conservation() {
    let mut rng = rng();
    for _ in 0..20 {
        let samples: Vec<u64> = (0..2000).map(|_| rng.gen_range(0..5_000_000)).collect();
        let mut h = Histogram::new(64, 1_000, 4_000_000).unwrap();
        h.build(&samples);
        assert_eq!(h.total_count(), samples.len() as u64);
    }
}

/// MAD outlier scenario: one far sample, flagged alone at its index.
#[test]
fn mad_outlier_scenario() {
    let samples = [100u64, 110, 120, 130, 1000];
    let mut flags = [false; 5];
    let mut scratch = OutlierScratch::new(samples.len());

    let count = detect_outliers(&samples, &mut flags, &mut scratch).unwrap();
    assert_eq!(count, 1);
    assert!(flags[4]);
    assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
}

/// Identical samples are never outliers.
#[test]
fn mad_uniform_input_flags_nothing() {
    for n in [1usize, 2, 10, 1000] {
        let samples = vec![42u64; n];
        let mut flags = vec![false; n];
        let mut scratch = OutlierScratch::new(n);

        let count = detect_outliers(&samples, &mut flags, &mut scratch).unwrap();
        assert_eq!(count, 0, "n={n}");
    }
}

/// The inline outlier count and the MAD detector are different criteria;
/// both run without interfering.
#[test]
fn two_outlier_criteria_coexist() {
    let mut samples = vec![100u64; 99];
    samples.push(100_000);

    let issue_order = samples.clone();
    let mut flags = vec![false; samples.len()];
    let mut scratch = OutlierScratch::new(samples.len());
    let mad_count = detect_outliers(&issue_order, &mut flags, &mut scratch).unwrap();

    let mut faults = FaultFlags::new();
    let stats = compute_stats(&mut samples, &mut faults).unwrap();

    assert_eq!(mad_count, 0, "MAD of a uniform body is zero, nothing flagged");
    assert_eq!(stats.outlier_count, 1, "threshold criterion flags the spike");
    // issue_order must be untouched by detection.
    assert_eq!(issue_order[99], 100_000);
}

/// Statistics are identical across repeated computation of the same data.
#[test]
fn stats_are_deterministic() {
    let mut rng = rng();
    let reference: Vec<u64> = (0..997).map(|_| rng.gen_range(0..1_000_000)).collect();

    let mut a = reference.clone();
    let mut fa = FaultFlags::new();
    let sa = compute_stats(&mut a, &mut fa).unwrap();

    let mut b = reference;
    let mut fb = FaultFlags::new();
    let sb = compute_stats(&mut b, &mut fb).unwrap();

    assert_eq!(sa, sb);
}

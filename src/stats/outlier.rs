//! MAD-based outlier detection.
//!
//! Uses the modified Z-score in scaled-integer form: a sample is an
//! outlier iff `6745 * |x - median| / MAD > 35_000`, the integer rendering
//! of `|z| > 3.5` with `z = 0.6745 * (x - median) / MAD`.

use crate::config::MAX_SAMPLES;
use crate::error::Error;

use super::percentile::percentile;
use super::sort::sort_u64;

/// Scaling factor for the modified Z-score numerator: `0.6745 * 10_000`.
const MAD_SCALE_FACTOR: u64 = 6745;

/// Outlier threshold: `3.5 * 10_000`.
const OUTLIER_THRESHOLD_SCALED: u64 = 35_000;

/// Reusable working memory for outlier detection.
///
/// Detection needs a sorted copy of the samples and a deviation buffer.
/// Both are allocated once here and reused across calls, so the detection
/// pass itself never allocates. The single-threaded run contract serialises
/// access.
#[derive(Debug)]
pub struct OutlierScratch {
    sorted: Vec<u64>,
    deviations: Vec<u64>,
}

impl OutlierScratch {
    /// Scratch sized for up to `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(MAX_SAMPLES);
        Self {
            sorted: Vec::with_capacity(capacity),
            deviations: Vec::with_capacity(capacity),
        }
    }

    /// Scratch sized for the maximum permitted sample count.
    pub fn max_capacity() -> Self {
        Self::new(MAX_SAMPLES)
    }

    /// Samples this scratch can process without reallocating.
    pub fn capacity(&self) -> usize {
        self.sorted.capacity()
    }
}

/// Flag outliers by modified Z-score, writing one flag per sample.
///
/// Returns the number of flagged samples. When the MAD is zero (all
/// samples identical or nearly so) nothing is flagged: uniformity is not
/// an outlier condition.
///
/// # Errors
///
/// Returns [`Error::BufferTooSmall`] when `flags` is shorter than
/// `samples` or the scratch capacity cannot hold the sample count.
pub fn detect_outliers(
    samples: &[u64],
    flags: &mut [bool],
    scratch: &mut OutlierScratch,
) -> Result<u32, Error> {
    if flags.len() < samples.len() {
        return Err(Error::BufferTooSmall {
            capacity: flags.len(),
            required: samples.len(),
        });
    }
    if samples.len() > scratch.capacity() {
        return Err(Error::BufferTooSmall {
            capacity: scratch.capacity(),
            required: samples.len(),
        });
    }
    if samples.is_empty() {
        return Ok(0);
    }

    // Median over a sorted copy; issue order in `samples` is preserved.
    scratch.sorted.clear();
    scratch.sorted.extend_from_slice(samples);
    sort_u64(&mut scratch.sorted);
    let median = percentile(&scratch.sorted, 50);

    // MAD = median of absolute deviations from the median.
    scratch.deviations.clear();
    scratch
        .deviations
        .extend(samples.iter().map(|&x| x.abs_diff(median)));
    sort_u64(&mut scratch.deviations);
    let mad = percentile(&scratch.deviations, 50);

    if mad == 0 {
        for f in flags[..samples.len()].iter_mut() {
            *f = false;
        }
        return Ok(0);
    }

    let mut count = 0u32;
    for (i, &x) in samples.iter().enumerate() {
        let deviation = x.abs_diff(median);
        let modified_z_scaled = MAD_SCALE_FACTOR.saturating_mul(deviation) / mad;
        let is_outlier = modified_z_scaled > OUTLIER_THRESHOLD_SCALED;
        flags[i] = is_outlier;
        if is_outlier {
            count += 1;
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlier_vector() {
        // Median 120, MAD 10: only the 1000 sample crosses the threshold.
        let samples = [100u64, 110, 120, 130, 1000];
        let mut flags = [false; 5];
        let mut scratch = OutlierScratch::new(samples.len());

        let count = detect_outliers(&samples, &mut flags, &mut scratch).unwrap();
        assert_eq!(count, 1);
        assert_eq!(flags, [false, false, false, false, true]);
    }

    #[test]
    fn test_no_outliers_in_tight_cluster() {
        let samples = [100u64, 102, 104, 106, 108, 110];
        let mut flags = [false; 6];
        let mut scratch = OutlierScratch::new(samples.len());

        let count = detect_outliers(&samples, &mut flags, &mut scratch).unwrap();
        assert_eq!(count, 0);
        assert!(flags.iter().all(|&f| !f));
    }

    #[test]
    fn test_mad_zero_flags_nothing() {
        // All identical: MAD is 0, nothing is an outlier even though the
        // naive z-score would divide by zero.
        let samples = [500u64; 50];
        let mut flags = [true; 50];
        let mut scratch = OutlierScratch::new(samples.len());

        let count = detect_outliers(&samples, &mut flags, &mut scratch).unwrap();
        assert_eq!(count, 0);
        assert!(flags.iter().all(|&f| !f));
    }

    #[test]
    fn test_empty_input() {
        let mut flags: [bool; 0] = [];
        let mut scratch = OutlierScratch::new(16);
        assert_eq!(detect_outliers(&[], &mut flags, &mut scratch).unwrap(), 0);
    }

    #[test]
    fn test_flags_buffer_too_small() {
        let samples = [1u64, 2, 3];
        let mut flags = [false; 2];
        let mut scratch = OutlierScratch::new(3);
        assert!(matches!(
            detect_outliers(&samples, &mut flags, &mut scratch),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_scratch_too_small() {
        let samples = [1u64, 2, 3, 4];
        let mut flags = [false; 4];
        let mut scratch = OutlierScratch::new(2);
        assert!(matches!(
            detect_outliers(&samples, &mut flags, &mut scratch),
            Err(Error::BufferTooSmall { .. })
        ));
    }

    #[test]
    fn test_scratch_reuse() {
        let mut scratch = OutlierScratch::new(8);
        let mut flags = [false; 8];

        let a = [10u64, 11, 12, 13, 9000];
        let count = detect_outliers(&a, &mut flags[..5], &mut scratch).unwrap();
        assert_eq!(count, 1);

        let b = [20u64, 20, 20, 20, 20, 20, 20, 20];
        let count = detect_outliers(&b, &mut flags, &mut scratch).unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_symmetric_outliers() {
        // Outliers on both sides of the median are flagged.
        let samples = [1u64, 500, 502, 504, 506, 508, 510, 9000];
        let mut flags = [false; 8];
        let mut scratch = OutlierScratch::new(samples.len());

        let count = detect_outliers(&samples, &mut flags, &mut scratch).unwrap();
        assert_eq!(count, 2);
        assert!(flags[0]);
        assert!(flags[7]);
    }
}

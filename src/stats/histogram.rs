//! Fixed-width latency histogram.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Latency histogram with half-open bins `[min, max)` and two sentinel
/// counters for samples outside the range.
///
/// The bin array is sized once at construction; [`build`] only writes
/// counts and never allocates, so it is safe to call from result assembly.
///
/// [`build`]: Histogram::build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Histogram {
    /// Lower bound of the histogram range, inclusive.
    pub range_min_ns: u64,
    /// Upper bound of the histogram range, exclusive.
    pub range_max_ns: u64,
    /// Width of each bin in nanoseconds.
    pub bin_width_ns: u64,
    /// Samples below `range_min_ns`.
    pub underflow_count: u32,
    /// Samples at or above `range_max_ns`.
    pub overflow_count: u32,
    /// Per-bin sample counts. Bin `i` covers
    /// `[range_min_ns + i * bin_width_ns, range_min_ns + (i + 1) * bin_width_ns)`.
    pub counts: Vec<u32>,
}

impl Histogram {
    /// Allocate a histogram over `[min_ns, max_ns)` with `num_bins` bins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for zero bins or an empty range.
    pub fn new(num_bins: u32, min_ns: u64, max_ns: u64) -> Result<Self, Error> {
        if num_bins == 0 {
            return Err(Error::InvalidConfig("histogram needs at least one bin"));
        }
        if min_ns >= max_ns {
            return Err(Error::InvalidConfig("histogram range is empty"));
        }

        let bin_width = ((max_ns - min_ns) / num_bins as u64).max(1);

        Ok(Self {
            range_min_ns: min_ns,
            range_max_ns: max_ns,
            bin_width_ns: bin_width,
            underflow_count: 0,
            overflow_count: 0,
            counts: vec![0; num_bins as usize],
        })
    }

    /// Bin every sample. Resets all counts first; does not allocate.
    ///
    /// The conservation invariant holds afterwards: the bin counts plus
    /// both sentinels sum to `samples.len()`.
    pub fn build(&mut self, samples: &[u64]) {
        self.underflow_count = 0;
        self.overflow_count = 0;
        for c in &mut self.counts {
            *c = 0;
        }

        let num_bins = self.counts.len();
        for &sample in samples {
            if sample < self.range_min_ns {
                self.underflow_count += 1;
            } else if sample >= self.range_max_ns {
                self.overflow_count += 1;
            } else {
                let mut idx = ((sample - self.range_min_ns) / self.bin_width_ns) as usize;
                // The final bin absorbs the rounding slack when the range
                // does not divide evenly by the bin width.
                if idx >= num_bins {
                    idx = num_bins - 1;
                }
                self.counts[idx] += 1;
            }
        }
    }

    /// Number of bins.
    pub fn num_bins(&self) -> usize {
        self.counts.len()
    }

    /// Sum of all bin counts plus both sentinels.
    pub fn total_count(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum::<u64>()
            + self.underflow_count as u64
            + self.overflow_count as u64
    }
}

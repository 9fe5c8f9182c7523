//! Benchmark configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::timer::TimerSource;

/// Maximum benchmark iterations per run.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Maximum histogram bin count.
pub const MAX_HISTOGRAM_BINS: usize = 256;

/// Configuration for a benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Iterations executed before measurement begins (default: 100).
    pub warmup_iterations: u32,

    /// Iterations measured (default: 1,000). Must be in `1..=1_000_000`.
    pub measure_iterations: u32,

    /// Inference batch size (default: 1). Must be nonzero.
    pub batch_size: u32,

    /// Preferred timer backend (default: auto-detect).
    pub timer_source: TimerSource,

    /// Hash every output during the run for bit-identity (default: true).
    pub verify_outputs: bool,

    /// Collect a latency histogram at result assembly (default: false).
    pub collect_histogram: bool,

    /// Number of histogram bins (default: 100).
    pub histogram_bins: u32,

    /// Histogram lower bound in nanoseconds, inclusive (default: 0).
    pub histogram_min_ns: u64,

    /// Histogram upper bound in nanoseconds, exclusive (default: 10 ms).
    pub histogram_max_ns: u64,

    /// Capture environmental snapshots around the run (default: true).
    pub monitor_environment: bool,

    /// Path to the model bundle, if any.
    pub model_path: Option<PathBuf>,

    /// Path to the test data, if any.
    pub data_path: Option<PathBuf>,

    /// Path to the golden reference, if any.
    pub golden_path: Option<PathBuf>,

    /// Path for the result JSON, if any.
    pub output_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            warmup_iterations: 100,
            measure_iterations: 1000,
            batch_size: 1,
            timer_source: TimerSource::Auto,
            verify_outputs: true,
            collect_histogram: false,
            histogram_bins: 100,
            histogram_min_ns: 0,
            histogram_max_ns: 10_000_000,
            monitor_environment: true,
            model_path: None,
            data_path: None,
            golden_path: None,
            output_path: None,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when iteration counts or the
    /// histogram range are out of bounds.
    pub fn validate(&self) -> Result<(), Error> {
        if self.measure_iterations == 0 {
            return Err(Error::InvalidConfig("measure_iterations must be > 0"));
        }
        if self.measure_iterations as usize > MAX_SAMPLES {
            return Err(Error::InvalidConfig(
                "measure_iterations exceeds the maximum sample count",
            ));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0"));
        }
        if self.collect_histogram {
            if self.histogram_bins == 0 || self.histogram_bins as usize > MAX_HISTOGRAM_BINS {
                return Err(Error::InvalidConfig("histogram_bins out of range"));
            }
            if self.histogram_max_ns <= self.histogram_min_ns {
                return Err(Error::InvalidConfig(
                    "histogram_max_ns must exceed histogram_min_ns",
                ));
            }
        }
        Ok(())
    }
}

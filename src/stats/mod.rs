//! Integer statistics for latency samples.
//!
//! Every operation in this module is integer-only and deterministic across
//! platforms: no floating point, no `sqrt`, no platform-variant comparator.
//! Sorting is insertion sort for small inputs and heapsort above the
//! threshold; quicksort is not used because its pivot choice is not fixed
//! by the interface.

mod histogram;
mod isqrt;
mod outlier;
mod percentile;
mod sort;
mod summary;

pub use histogram::Histogram;
pub use isqrt::isqrt64;
pub use outlier::{detect_outliers, OutlierScratch};
pub use percentile::percentile;
pub use sort::sort_u64;
pub use summary::compute_stats;

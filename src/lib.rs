//! # certifiable-bench
//!
//! Deterministic inference benchmarking with cryptographic result binding.
//!
//! This crate measures latency, throughput, and an empirical worst-case
//! execution time envelope for a user-supplied deterministic inference
//! routine, and binds those numbers to the byte-exact output the routine
//! produced during measurement. Two results from different hardware may
//! only be compared for performance when their bound output digests are
//! equal — the bit-identity gate.
//!
//! All statistics are integer-only, so a result computed on one platform
//! is bit-identical to the same computation on any other.
//!
//! ## Quick start
//!
//! ```ignore
//! use certifiable_bench::{run_benchmark, Config};
//!
//! let config = Config::default();
//! let input = [0u8; 64];
//! let mut output = [0u8; 64];
//! let mut samples = vec![0u64; config.measure_iterations as usize];
//!
//! let result = run_benchmark(
//!     &config,
//!     |input, output| my_model.infer(input, output),
//!     &input,
//!     &mut output,
//!     &mut samples,
//! )?;
//!
//! assert!(result.is_valid());
//! println!("p99: {} ns, WCET bound: {} ns",
//!     result.latency.p99_ns, result.latency.wcet_bound_ns);
//! ```
//!
//! ## Comparing runs across platforms
//!
//! ```ignore
//! use certifiable_bench::compare::compare_results;
//!
//! let cmp = compare_results(&result_a, &result_b);
//! if cmp.comparable {
//!     println!("p99 ratio: {}", certifiable_bench::compare::format_ratio_q16(cmp.latency_ratio_q16));
//! } else {
//!     println!("outputs differ; performance comparison is not meaningful");
//! }
//! ```
//!
//! ## Design constraints
//!
//! - Nothing allocates inside the critical measurement loop; the sample
//!   buffer is caller-provided and the hasher buffers internally.
//! - A single benchmark run is single-threaded by contract. The runner
//!   spawns no threads and holds no lock.
//! - Floating point appears only at the presentation boundary; every
//!   decision, hash, ratio, and persisted value is integer-derived.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod compare;
mod config;
mod error;
mod faults;
pub mod golden;
pub mod hash;
pub mod platform;
pub mod report;
mod result;
mod runner;
pub mod stats;
pub mod timer;

pub use config::{Config, MAX_HISTOGRAM_BINS, MAX_SAMPLES};
pub use error::{Error, InferenceError};
pub use faults::FaultFlags;
pub use golden::GoldenRef;
pub use hash::{sha256, Digest, Sha256};
pub use result::{BenchResult, LatencyStats, Throughput};
pub use runner::{run_benchmark, Runner};
pub use timer::{Timer, TimerSource};

/// Schema version written into every result record.
pub const RESULT_SCHEMA_VERSION: &str = "1.0";

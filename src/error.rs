//! Error taxonomy for benchmark operations.
//!
//! Recoverable measurement conditions (overflow, timer wrap, inference
//! failure) do not surface here; they set sticky [`FaultFlags`] bits on the
//! run instead and the run continues. `Error` covers the conditions that
//! stop an operation before or outside the critical loop.
//!
//! [`FaultFlags`]: crate::faults::FaultFlags

use thiserror::Error;

/// Errors returned by configuration, lifecycle, and I/O operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A configuration field or call sequence is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// No usable timer backend could be initialised.
    #[error("timer initialisation failed")]
    TimerInit,

    /// The underlying clock failed during a read.
    #[error("timer read failed")]
    TimerRead,

    /// Integer arithmetic saturated where an exact value was required.
    #[error("arithmetic overflow")]
    Overflow,

    /// Output verification failed against the golden reference.
    #[error("output verification failed")]
    Verification,

    /// Hardware performance counters are unavailable or failed.
    #[error("hardware counters unavailable")]
    HwCounters,

    /// An environmental sensor read failed.
    #[error("environment probe failed")]
    EnvRead,

    /// A golden reference document was missing a mandatory field or
    /// otherwise malformed.
    #[error("malformed golden reference: {0}")]
    GoldenLoad(String),

    /// File I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller-provided buffer is smaller than the operation requires.
    #[error("buffer too small: capacity {capacity}, required {required}")]
    BufferTooSmall {
        /// Elements the buffer can hold.
        capacity: usize,
        /// Elements the operation needs.
        required: usize,
    },
}

/// Failure code returned by an inference routine.
///
/// The runner treats any inference failure identically: the `verify_fail`
/// fault is set, the failure is counted, and the measurement loop continues
/// so latency data is still produced. The code is opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceError(pub u32);

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "inference failed with code {}", self.0)
    }
}

impl std::error::Error for InferenceError {}

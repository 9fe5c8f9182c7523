//! Sticky fault flags for benchmark runs.
//!
//! Faults are sticky: once set during a run they persist until the run is
//! torn down. The first five flags are *hard* faults whose presence
//! invalidates the result for certification use; `thermal_drift` is a
//! warning only.

use serde::{Deserialize, Serialize};

/// Fault state accumulated over a benchmark run.
///
/// A small value type, copied into the result record at assembly time.
/// Never shared or global: each run carries its own flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultFlags {
    /// An accumulator or the WCET computation saturated.
    pub overflow: bool,
    /// An unexpected negative value was produced.
    pub underflow: bool,
    /// A division by zero was attempted (zero-sample statistics).
    pub div_zero: bool,
    /// A timer read failed or wrapped between successive reads.
    pub timer_error: bool,
    /// Output verification failed (determinism broken).
    pub verify_fail: bool,
    /// CPU frequency dropped more than 5% or throttling occurred. Warning.
    pub thermal_drift: bool,
}

impl FaultFlags {
    /// A cleared flag set.
    pub const fn new() -> Self {
        Self {
            overflow: false,
            underflow: false,
            div_zero: false,
            timer_error: false,
            verify_fail: false,
            thermal_drift: false,
        }
    }

    /// True if any hard fault is set. A result with a hard fault must not
    /// be used as certification evidence.
    pub fn has_hard_fault(&self) -> bool {
        self.overflow || self.underflow || self.div_zero || self.timer_error || self.verify_fail
    }

    /// True if any warning is set. The result may still be valid.
    pub fn has_warning(&self) -> bool {
        self.thermal_drift
    }

    /// Clear all flags.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Merge another flag set into this one. Sticky semantics: bits only
    /// ever turn on.
    pub fn merge(&mut self, other: &FaultFlags) {
        self.overflow |= other.overflow;
        self.underflow |= other.underflow;
        self.div_zero |= other.div_zero;
        self.timer_error |= other.timer_error;
        self.verify_fail |= other.verify_fail;
        self.thermal_drift |= other.thermal_drift;
    }
}

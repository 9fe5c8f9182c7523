//! Hardware performance counters via Linux perf_event.
//!
//! Enabled with the `perf` feature. Requires root, `CAP_PERFMON`, or
//! `kernel.perf_event_paranoid <= 2`. Counters are strictly optional: a
//! missing or failing counter session leaves the result's snapshot absent
//! and never faults the run.
//!
//! Derived rates are Q16.16 fixed point so persisted values stay integer;
//! convert to floating point only when printing.

use serde::{Deserialize, Serialize};

/// Hardware counter readings for one measurement phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HwCounters {
    /// CPU cycles.
    pub cycles: u64,
    /// Instructions retired.
    pub instructions: u64,
    /// Cache references.
    pub cache_refs: u64,
    /// Cache misses.
    pub cache_misses: u64,
    /// Branch instructions.
    pub branch_refs: u64,
    /// Branch mispredictions.
    pub branch_misses: u64,
    /// Instructions per cycle, Q16.16.
    pub ipc_q16: u32,
    /// Cache miss rate, Q16.16 (65536 = 100%).
    pub cache_miss_rate_q16: u32,
}

impl HwCounters {
    /// Fill the derived Q16.16 rates from the raw counts. Division by zero
    /// collapses a rate to 0.
    pub fn derive_rates(&mut self) {
        self.ipc_q16 = if self.cycles > 0 {
            (((self.instructions as u128) << 16) / self.cycles as u128).min(u32::MAX as u128) as u32
        } else {
            0
        };
        self.cache_miss_rate_q16 = if self.cache_refs > 0 {
            (((self.cache_misses as u128) << 16) / self.cache_refs as u128).min(u32::MAX as u128)
                as u32
        } else {
            0
        };
    }
}

/// An open set of perf_event counters.
///
/// Construction fails gracefully when the kernel refuses access; callers
/// treat `Err` as "counters unavailable".
#[cfg(all(target_os = "linux", feature = "perf"))]
pub struct HwCounterSession {
    cycles: perf_event2::Counter,
    instructions: perf_event2::Counter,
    cache_refs: perf_event2::Counter,
    cache_misses: perf_event2::Counter,
    branch_refs: perf_event2::Counter,
    branch_misses: perf_event2::Counter,
}

#[cfg(all(target_os = "linux", feature = "perf"))]
impl HwCounterSession {
    /// Open all six counters for the current thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HwCounters`] when any counter cannot be opened,
    /// typically for lack of permissions.
    ///
    /// [`Error::HwCounters`]: crate::error::Error::HwCounters
    pub fn open() -> Result<Self, crate::error::Error> {
        use perf_event2::events::Hardware;
        use perf_event2::Builder;

        let open = |event: Hardware| {
            Builder::new(event)
                .build()
                .map_err(|_| crate::error::Error::HwCounters)
        };

        Ok(Self {
            cycles: open(Hardware::CPU_CYCLES)?,
            instructions: open(Hardware::INSTRUCTIONS)?,
            cache_refs: open(Hardware::CACHE_REFERENCES)?,
            cache_misses: open(Hardware::CACHE_MISSES)?,
            branch_refs: open(Hardware::BRANCH_INSTRUCTIONS)?,
            branch_misses: open(Hardware::BRANCH_MISSES)?,
        })
    }

    /// Reset and enable every counter.
    pub fn start(&mut self) -> Result<(), crate::error::Error> {
        for counter in self.all_mut() {
            counter.reset().map_err(|_| crate::error::Error::HwCounters)?;
            counter.enable().map_err(|_| crate::error::Error::HwCounters)?;
        }
        Ok(())
    }

    /// Disable every counter and collect the readings.
    pub fn stop(&mut self) -> Result<HwCounters, crate::error::Error> {
        for counter in self.all_mut() {
            counter.disable().map_err(|_| crate::error::Error::HwCounters)?;
        }

        let mut out = HwCounters {
            cycles: self.cycles.read().unwrap_or(0),
            instructions: self.instructions.read().unwrap_or(0),
            cache_refs: self.cache_refs.read().unwrap_or(0),
            cache_misses: self.cache_misses.read().unwrap_or(0),
            branch_refs: self.branch_refs.read().unwrap_or(0),
            branch_misses: self.branch_misses.read().unwrap_or(0),
            ipc_q16: 0,
            cache_miss_rate_q16: 0,
        };
        out.derive_rates();
        Ok(out)
    }

    fn all_mut(&mut self) -> [&mut perf_event2::Counter; 6] {
        [
            &mut self.cycles,
            &mut self.instructions,
            &mut self.cache_refs,
            &mut self.cache_misses,
            &mut self.branch_refs,
            &mut self.branch_misses,
        ]
    }
}

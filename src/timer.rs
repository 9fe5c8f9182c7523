//! Monotonic nanosecond timing with platform cycle-counter backends.
//!
//! Backends:
//! - x86_64: `lfence; rdtsc` when the TSC is invariant
//! - aarch64: `isb; mrs cntvct_el0` with `cntfrq_el0` for the frequency
//! - riscv64: `rdcycle` with wall-clock frequency calibration
//! - everywhere: `std::time::Instant` (CLOCK_MONOTONIC) as the portable
//!   fallback
//!
//! After init, cycle-counter backends never make a system call: `now_ns`
//! is a register read plus integer conversion through the calibrated
//! frequency.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::faults::FaultFlags;

/// Nanoseconds per second.
pub const NS_PER_SEC: u64 = 1_000_000_000;

/// Number of paired reads used to calibrate timer self-overhead.
const CALIBRATION_ITERATIONS: usize = 1000;

/// Requested timer backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerSource {
    /// Pick the highest-resolution backend available on this platform.
    #[default]
    Auto,
    /// Portable monotonic clock.
    Monotonic,
    /// x86 invariant timestamp counter.
    Tsc,
    /// ARM64 virtual counter.
    Cntvct,
    /// RISC-V cycle CSR.
    RiscvCycle,
}

/// The backend actually driving a [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Backend {
    Monotonic,
    #[cfg(target_arch = "x86_64")]
    Tsc,
    #[cfg(target_arch = "aarch64")]
    Cntvct,
    #[cfg(target_arch = "riscv64")]
    RiscvCycle,
}

/// Calibrated monotonic timer.
///
/// Value type owned by the runner for the duration of a run. Re-creating a
/// timer between runs is permitted and idempotent.
#[derive(Debug, Clone)]
pub struct Timer {
    backend: Backend,
    origin: Instant,
    resolution_ns: u64,
    freq_hz: u64,
    calibration_ns: u64,
}

impl Timer {
    /// Initialise a timer, honouring `preferred` where the backend exists
    /// on this platform and falling back to the portable monotonic clock
    /// otherwise.
    ///
    /// Calibration happens here: self-overhead is the minimum delta over
    /// 1000 back-to-back read pairs, resolution is queried per backend,
    /// and the counter frequency is recorded for cycle backends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TimerInit`] if the selected backend fails its
    /// initial read check.
    pub fn init(preferred: TimerSource) -> Result<Timer, Error> {
        let backend = select_backend(preferred);
        let origin = Instant::now();

        let freq_hz = match backend {
            Backend::Monotonic => 0,
            #[cfg(target_arch = "x86_64")]
            Backend::Tsc => calibrate_counter_freq(read_tsc),
            #[cfg(target_arch = "aarch64")]
            Backend::Cntvct => read_cntfrq(),
            #[cfg(target_arch = "riscv64")]
            Backend::RiscvCycle => calibrate_counter_freq(read_rdcycle),
        };

        // A cycle backend with no usable frequency cannot convert to
        // nanoseconds; drop to the monotonic clock.
        let backend = if backend != Backend::Monotonic && freq_hz == 0 {
            Backend::Monotonic
        } else {
            backend
        };
        let freq_hz = if backend == Backend::Monotonic { 0 } else { freq_hz };

        let mut timer = Timer {
            backend,
            origin,
            resolution_ns: 1,
            freq_hz,
            calibration_ns: 0,
        };

        timer.resolution_ns = match backend {
            Backend::Monotonic => probe_monotonic_resolution(&timer),
            #[allow(unreachable_patterns)]
            _ => (NS_PER_SEC / freq_hz.max(1)).max(1),
        };

        // Two successive reads must not go backwards even during init.
        let a = timer.now_ns();
        let b = timer.now_ns();
        if b < a {
            return Err(Error::TimerInit);
        }

        timer.calibration_ns = timer.calibrate_overhead();
        Ok(timer)
    }

    /// Current monotonic timestamp in nanoseconds.
    ///
    /// Non-blocking, never allocates, monotonically non-decreasing. On
    /// cycle-counter backends this is a register read and integer
    /// conversion, with no system call.
    #[inline]
    pub fn now_ns(&self) -> u64 {
        match self.backend {
            Backend::Monotonic => self.origin.elapsed().as_nanos() as u64,
            #[cfg(target_arch = "x86_64")]
            Backend::Tsc => self.convert_saturating(read_tsc()),
            #[cfg(target_arch = "aarch64")]
            Backend::Cntvct => self.convert_saturating(read_cntvct()),
            #[cfg(target_arch = "riscv64")]
            Backend::RiscvCycle => self.convert_saturating(read_rdcycle()),
        }
    }

    /// Timer resolution in nanoseconds. At most 1 µs on supported
    /// platforms.
    pub fn resolution_ns(&self) -> u64 {
        self.resolution_ns
    }

    /// Measured self-overhead of a `now_ns` call pair.
    pub fn calibration_ns(&self) -> u64 {
        self.calibration_ns
    }

    /// Counter frequency in Hz, or 0 for the monotonic backend (whose
    /// readings are already nanoseconds).
    pub fn freq_hz(&self) -> u64 {
        self.freq_hz
    }

    /// Backend name for diagnostics and result metadata.
    pub fn name(&self) -> &'static str {
        match self.backend {
            Backend::Monotonic => "monotonic (CLOCK_MONOTONIC)",
            #[cfg(target_arch = "x86_64")]
            Backend::Tsc => "x86_64 (rdtsc)",
            #[cfg(target_arch = "aarch64")]
            Backend::Cntvct => "arm64 (cntvct_el0)",
            #[cfg(target_arch = "riscv64")]
            Backend::RiscvCycle => "risc-v (cycle csr)",
        }
    }

    /// The source actually selected after availability fallback.
    pub fn source(&self) -> TimerSource {
        match self.backend {
            Backend::Monotonic => TimerSource::Monotonic,
            #[cfg(target_arch = "x86_64")]
            Backend::Tsc => TimerSource::Tsc,
            #[cfg(target_arch = "aarch64")]
            Backend::Cntvct => TimerSource::Cntvct,
            #[cfg(target_arch = "riscv64")]
            Backend::RiscvCycle => TimerSource::RiscvCycle,
        }
    }

    /// Convert a raw counter value to nanoseconds using the calibrated
    /// frequency. Identity for the monotonic backend, whose values are
    /// already nanoseconds.
    ///
    /// The conversion splits into whole seconds and remainder so the
    /// multiply cannot silently wrap:
    ///
    /// ```text
    /// ns = (cycles / freq) * 1e9 + (cycles % freq) * 1e9 / freq
    /// ```
    ///
    /// On overflow of either term, saturates to `u64::MAX` and sets the
    /// `overflow` fault.
    pub fn cycles_to_ns(&self, cycles: u64, faults: &mut FaultFlags) -> u64 {
        if self.freq_hz == 0 {
            return cycles;
        }

        let whole_secs = cycles / self.freq_hz;
        let remainder = cycles % self.freq_hz;

        let Some(ns_whole) = whole_secs.checked_mul(NS_PER_SEC) else {
            faults.overflow = true;
            return u64::MAX;
        };
        let ns_rem = ((remainder as u128 * NS_PER_SEC as u128) / self.freq_hz as u128) as u64;

        match ns_whole.checked_add(ns_rem) {
            Some(ns) => ns,
            None => {
                faults.overflow = true;
                u64::MAX
            }
        }
    }

    /// Internal conversion for `now_ns`: saturates without a fault sink.
    #[inline]
    #[allow(dead_code)]
    fn convert_saturating(&self, cycles: u64) -> u64 {
        if self.freq_hz == 0 {
            return cycles;
        }
        let whole_secs = cycles / self.freq_hz;
        let remainder = cycles % self.freq_hz;
        let ns_rem = ((remainder as u128 * NS_PER_SEC as u128) / self.freq_hz as u128) as u64;
        whole_secs
            .saturating_mul(NS_PER_SEC)
            .saturating_add(ns_rem)
    }

    /// Minimum observed gap between back-to-back reads. Taking the
    /// minimum discards scheduling and cache noise.
    fn calibrate_overhead(&self) -> u64 {
        let mut min_overhead = u64::MAX;
        for _ in 0..CALIBRATION_ITERATIONS {
            let start = self.now_ns();
            let end = self.now_ns();
            if end >= start {
                min_overhead = min_overhead.min(end - start);
            }
        }
        if min_overhead == u64::MAX {
            0
        } else {
            min_overhead
        }
    }
}

fn select_backend(preferred: TimerSource) -> Backend {
    match preferred {
        TimerSource::Auto => best_available(),
        TimerSource::Monotonic => Backend::Monotonic,
        #[cfg(target_arch = "x86_64")]
        TimerSource::Tsc if tsc_invariant() => Backend::Tsc,
        #[cfg(target_arch = "aarch64")]
        TimerSource::Cntvct => Backend::Cntvct,
        #[cfg(target_arch = "riscv64")]
        TimerSource::RiscvCycle => Backend::RiscvCycle,
        // Requested source unavailable on this platform: portable fallback.
        _ => Backend::Monotonic,
    }
}

#[allow(unreachable_code)]
fn best_available() -> Backend {
    #[cfg(target_arch = "x86_64")]
    {
        if tsc_invariant() {
            return Backend::Tsc;
        }
    }
    #[cfg(target_arch = "aarch64")]
    {
        return Backend::Cntvct;
    }
    #[cfg(target_arch = "riscv64")]
    {
        return Backend::RiscvCycle;
    }
    Backend::Monotonic
}

/// Smallest nonzero gap observed between monotonic reads.
fn probe_monotonic_resolution(timer: &Timer) -> u64 {
    let mut min_delta = u64::MAX;
    for _ in 0..4096 {
        let a = timer.now_ns();
        let b = timer.now_ns();
        if b > a {
            min_delta = min_delta.min(b - a);
        }
    }
    if min_delta == u64::MAX {
        1
    } else {
        min_delta
    }
}

/// Invariant-TSC check via CPUID leaf 0x8000_0007, EDX bit 8.
#[cfg(target_arch = "x86_64")]
fn tsc_invariant() -> bool {
    // Safety: CPUID is unprivileged and always present on x86_64.
    unsafe {
        let (max_ext, _, _, _) = {
            let r = std::arch::x86_64::__cpuid(0x8000_0000);
            (r.eax, r.ebx, r.ecx, r.edx)
        };
        if max_ext < 0x8000_0007 {
            return false;
        }
        let r = std::arch::x86_64::__cpuid(0x8000_0007);
        (r.edx >> 8) & 1 == 1
    }
}

/// Serialised timestamp-counter read.
#[cfg(target_arch = "x86_64")]
#[inline]
fn read_tsc() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    let cycles: u64;
    unsafe {
        // lfence orders the read after all prior instructions complete.
        std::arch::asm!(
            "lfence",
            "rdtsc",
            "shl rdx, 32",
            "or rax, rdx",
            out("rax") cycles,
            out("rdx") _,
            options(nostack, nomem),
        );
    }
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    cycles
}

/// Virtual counter read, serialised by `isb`.
#[cfg(target_arch = "aarch64")]
#[inline]
fn read_cntvct() -> u64 {
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    let cycles: u64;
    unsafe {
        std::arch::asm!(
            "isb",
            "mrs {}, cntvct_el0",
            out(reg) cycles,
            options(nostack, nomem),
        );
    }
    std::sync::atomic::compiler_fence(std::sync::atomic::Ordering::SeqCst);
    cycles
}

/// Architected counter frequency.
#[cfg(target_arch = "aarch64")]
fn read_cntfrq() -> u64 {
    let freq: u64;
    unsafe {
        std::arch::asm!("mrs {}, cntfrq_el0", out(reg) freq, options(nostack, nomem));
    }
    freq
}

/// Cycle CSR read.
#[cfg(target_arch = "riscv64")]
#[inline]
fn read_rdcycle() -> u64 {
    let cycles: u64;
    unsafe {
        std::arch::asm!("rdcycle {}", out(reg) cycles, options(nostack, nomem));
    }
    cycles
}

/// Estimate a raw counter's frequency against the wall clock.
///
/// Several short busy-wait windows, median of the per-window ratios.
/// Init-time only; the measurement path never calls this.
#[allow(dead_code)]
fn calibrate_counter_freq(read: fn() -> u64) -> u64 {
    const WINDOWS: usize = 5;
    const WINDOW_NS: u64 = 2_000_000;

    let mut estimates = [0u64; WINDOWS];
    let mut filled = 0;

    for slot in estimates.iter_mut() {
        let wall_start = Instant::now();
        let count_start = read();

        // Busy wait so cycle counters that only advance while running
        // (e.g. rdcycle) stay live.
        let mut spin = 0u64;
        while (wall_start.elapsed().as_nanos() as u64) < WINDOW_NS {
            spin = spin.wrapping_mul(6364136223846793005).wrapping_add(1);
            std::hint::black_box(spin);
        }

        let count_end = read();
        let elapsed_ns = wall_start.elapsed().as_nanos() as u64;
        let cycles = count_end.saturating_sub(count_start);

        if elapsed_ns > 0 && cycles > 0 {
            *slot = ((cycles as u128 * NS_PER_SEC as u128) / elapsed_ns as u128) as u64;
            filled += 1;
        }
    }

    if filled == 0 {
        return 0;
    }
    let estimates = &mut estimates[..filled];
    estimates.sort_unstable();
    estimates[filled / 2]
}

//! Environmental monitoring: CPU frequency, temperature, throttling.
//!
//! Snapshots are taken at warmup completion and at result assembly. A
//! machine without the relevant sysfs nodes reports zeros, which the
//! stability predicate treats as "no data" rather than instability.

use serde::{Deserialize, Serialize};

/// Point-in-time environmental snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvSnapshot {
    /// Monotonic timestamp of the snapshot, in nanoseconds.
    pub timestamp_ns: u64,
    /// CPU frequency in Hz; 0 when unavailable.
    pub cpu_freq_hz: u64,
    /// CPU temperature in millidegrees Celsius; 0 when unavailable.
    pub cpu_temp_mc: i32,
    /// Cumulative throttle event count since boot; 0 when unavailable.
    pub throttle_count: u32,
}

impl EnvSnapshot {
    /// Capture the current environmental state.
    ///
    /// `timestamp_ns` is supplied by the caller so snapshots share the
    /// run's timer rather than making an extra clock call here.
    pub fn capture(timestamp_ns: u64) -> EnvSnapshot {
        EnvSnapshot {
            timestamp_ns,
            cpu_freq_hz: crate::platform::cpu_freq_hz().unwrap_or(0),
            cpu_temp_mc: read_cpu_temp_mc().unwrap_or(0),
            throttle_count: read_throttle_count().unwrap_or(0),
        }
    }
}

#[cfg(target_os = "linux")]
fn read_cpu_temp_mc() -> Option<i32> {
    let raw = crate::platform::read_sysfs_u64("/sys/class/thermal/thermal_zone0/temp")?;
    i32::try_from(raw).ok()
}

#[cfg(not(target_os = "linux"))]
fn read_cpu_temp_mc() -> Option<i32> {
    None
}

#[cfg(target_os = "linux")]
fn read_throttle_count() -> Option<u32> {
    let raw = crate::platform::read_sysfs_u64(
        "/sys/devices/system/cpu/cpu0/thermal_throttle/core_throttle_count",
    )?;
    u32::try_from(raw).ok()
}

#[cfg(not(target_os = "linux"))]
fn read_throttle_count() -> Option<u32> {
    None
}

/// Environmental statistics over a benchmark run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvStats {
    /// Snapshot at warmup completion.
    pub start: EnvSnapshot,
    /// Snapshot at result assembly.
    pub end: EnvSnapshot,
    /// Minimum frequency over the observed snapshots.
    pub min_freq_hz: u64,
    /// Maximum frequency over the observed snapshots.
    pub max_freq_hz: u64,
    /// Minimum temperature over the observed snapshots.
    pub min_temp_mc: i32,
    /// Maximum temperature over the observed snapshots.
    pub max_temp_mc: i32,
    /// Throttle events that occurred during the run.
    pub total_throttle_events: u32,
}

impl EnvStats {
    /// Derive run statistics from the start and end snapshots.
    pub fn between(start: EnvSnapshot, end: EnvSnapshot) -> EnvStats {
        EnvStats {
            start,
            end,
            min_freq_hz: start.cpu_freq_hz.min(end.cpu_freq_hz),
            max_freq_hz: start.cpu_freq_hz.max(end.cpu_freq_hz),
            min_temp_mc: start.cpu_temp_mc.min(end.cpu_temp_mc),
            max_temp_mc: start.cpu_temp_mc.max(end.cpu_temp_mc),
            total_throttle_events: end.throttle_count.saturating_sub(start.throttle_count),
        }
    }

    /// Stability predicate, integer-only.
    ///
    /// Stable iff the end frequency held at least 95% of the start
    /// frequency and no throttle events occurred. A zero start frequency
    /// means no data was available; stability is then assumed.
    pub fn is_stable(&self) -> bool {
        if self.total_throttle_events > 0 {
            return false;
        }
        if self.start.cpu_freq_hz == 0 {
            return true;
        }
        // end * 100 >= start * 95, avoiding division of the ratio.
        self.end.cpu_freq_hz.saturating_mul(100) >= self.start.cpu_freq_hz.saturating_mul(95)
    }
}

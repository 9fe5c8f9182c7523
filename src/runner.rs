//! Benchmark execution: warmup, critical loop, result assembly.
//!
//! The critical loop is the region between the two timer reads and
//! contains only the inference call:
//!
//! ```text
//! t_start = timer.now_ns()
//! rc      = infer(input, output)
//! t_end   = timer.now_ns()
//! samples[i] = t_end - t_start
//! ```
//!
//! Hashing, fault updates, and all bookkeeping happen strictly after
//! `t_end`. Nothing in the measurement path allocates: the sample buffer
//! is borrowed from the caller and the hasher buffers internally.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::compare::result_binding_digest;
use crate::config::Config;
use crate::error::{Error, InferenceError};
use crate::faults::FaultFlags;
use crate::golden::GoldenRef;
use crate::hash::{Digest, Sha256};
use crate::platform;
use crate::platform::env::{EnvSnapshot, EnvStats};
use crate::result::{BenchResult, Throughput};
use crate::stats::{compute_stats, Histogram};
use crate::timer::{Timer, NS_PER_SEC};

/// Run lifecycle phase. Operations check the phase instead of boolean
/// flags so an out-of-order call fails fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initialised,
    Warmed,
    Executed,
}

/// Benchmark runner.
///
/// Borrows the caller's sample buffer for the duration of the run and
/// owns the timer and hasher context. Single-threaded by contract: the
/// runner spawns nothing, yields nowhere, and holds no lock.
pub struct Runner<'buf> {
    config: Config,
    timer: Timer,
    samples: &'buf mut [u64],
    collected: usize,
    hasher: Option<Sha256>,
    output_size: usize,
    env_start: EnvSnapshot,
    benchmark_start_ns: u64,
    phase: Phase,
    faults: FaultFlags,
    verification_failures: u32,
}

impl<'buf> Runner<'buf> {
    /// Initialise a runner with a caller-provided sample buffer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfig`] for a configuration that fails
    ///   validation;
    /// - [`Error::BufferTooSmall`] when the buffer cannot hold
    ///   `measure_iterations` samples;
    /// - [`Error::TimerInit`] when no timer backend can be brought up.
    pub fn new(config: Config, samples: &'buf mut [u64]) -> Result<Self, Error> {
        config.validate()?;

        let required = config.measure_iterations as usize;
        if samples.len() < required {
            return Err(Error::BufferTooSmall {
                capacity: samples.len(),
                required,
            });
        }

        let timer = Timer::init(config.timer_source)?;
        let hasher = config.verify_outputs.then(Sha256::new);

        Ok(Self {
            config,
            timer,
            samples,
            collected: 0,
            hasher,
            output_size: 0,
            env_start: EnvSnapshot::default(),
            benchmark_start_ns: 0,
            phase: Phase::Initialised,
            faults: FaultFlags::new(),
            verification_failures: 0,
        })
    }

    /// The timer driving this run.
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Faults accumulated so far.
    pub fn faults(&self) -> FaultFlags {
        self.faults
    }

    /// Execute the warmup phase: exactly `warmup_iterations` inference
    /// calls with the same arguments the measurement loop will use. No
    /// latency is recorded.
    ///
    /// On success the environmental start snapshot is taken and the
    /// benchmark start timestamp recorded.
    ///
    /// # Errors
    ///
    /// An inference failure aborts warmup and surfaces unchanged as
    /// [`Error::Verification`] wrapping nothing further — the run can be
    /// retried after the caller fixes its routine. Calling after the
    /// measurement phase is [`Error::InvalidConfig`].
    pub fn warmup<F>(&mut self, mut infer: F, input: &[u8], output: &mut [u8]) -> Result<(), Error>
    where
        F: FnMut(&[u8], &mut [u8]) -> Result<(), InferenceError>,
    {
        if self.phase == Phase::Executed {
            return Err(Error::InvalidConfig("warmup after measurement"));
        }

        for _ in 0..self.config.warmup_iterations {
            if infer(input, output).is_err() {
                return Err(Error::Verification);
            }
        }

        if self.config.monitor_environment {
            self.env_start = EnvSnapshot::capture(self.timer.now_ns());
        }
        self.benchmark_start_ns = self.timer.now_ns();
        self.phase = Phase::Warmed;
        Ok(())
    }

    /// Execute the measurement phase. Warms up first if [`warmup`] has not
    /// run.
    ///
    /// An inference failure inside the loop does **not** abort it: the
    /// `verify_fail` fault is set, the failure counted, and latency data
    /// still collected so the (invalid) result remains inspectable.
    ///
    /// # Errors
    ///
    /// Only warmup errors and phase misuse surface here.
    ///
    /// [`warmup`]: Runner::warmup
    pub fn execute<F>(&mut self, mut infer: F, input: &[u8], output: &mut [u8]) -> Result<(), Error>
    where
        F: FnMut(&[u8], &mut [u8]) -> Result<(), InferenceError>,
    {
        if self.phase == Phase::Executed {
            return Err(Error::InvalidConfig("measurement already executed"));
        }
        if self.phase == Phase::Initialised {
            self.warmup(&mut infer, input, output)?;
        }

        self.output_size = output.len();
        let iterations = self.config.measure_iterations as usize;

        for i in 0..iterations {
            let t_start = self.timer.now_ns();
            let rc = infer(input, output);
            let t_end = self.timer.now_ns();

            // Raw delta in issue order; a wrap is recorded, not repaired.
            self.samples[i] = t_end.wrapping_sub(t_start);
            if t_end < t_start {
                self.faults.timer_error = true;
            }

            // Outside the timed region.
            if let Some(hasher) = &mut self.hasher {
                let _ = hasher.update(output);
            }

            if rc.is_err() {
                self.faults.verify_fail = true;
                self.verification_failures += 1;
            }
        }

        self.collected = iterations;
        self.phase = Phase::Executed;
        Ok(())
    }

    /// Assemble the benchmark result.
    ///
    /// Sorts the sample buffer in place for the percentile pass. The
    /// hasher context is finalised as a copy, so calling this twice
    /// produces identical results.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] before the measurement phase has run.
    pub fn result(&mut self) -> Result<BenchResult, Error> {
        if self.phase != Phase::Executed || self.collected == 0 {
            return Err(Error::InvalidConfig("no measurement to report"));
        }

        let mut result = BenchResult {
            platform: platform::platform_name().to_string(),
            cpu_model: platform::cpu_model(128),
            cpu_freq_mhz: platform::cpu_freq_mhz(),
            timer_name: self.timer.name().to_string(),
            warmup_iterations: self.config.warmup_iterations,
            measure_iterations: self.config.measure_iterations,
            batch_size: self.config.batch_size,
            ..BenchResult::default()
        };

        // Statistics sort the buffer; issue order is not needed afterwards.
        let mut stats_faults = FaultFlags::new();
        let samples = &mut self.samples[..self.collected];
        result.latency = compute_stats(samples, &mut stats_faults)?;

        // Throughput from the summed per-iteration latencies. On these
        // single-threaded serial runs this equals the wall-clock
        // formulation.
        let mut total_latency_ns = 0u64;
        for &s in samples.iter() {
            total_latency_ns = total_latency_ns.saturating_add(s);
        }
        let inferences_per_sec = if total_latency_ns > 0 {
            (self.collected as u64 * NS_PER_SEC) / total_latency_ns
        } else {
            0
        };
        result.throughput = Throughput {
            inferences_per_sec,
            samples_per_sec: inferences_per_sec.saturating_mul(self.config.batch_size as u64),
            bytes_per_sec: inferences_per_sec.saturating_mul(self.output_size as u64),
            batch_size: self.config.batch_size,
        };

        if self.config.monitor_environment {
            let env_end = EnvSnapshot::capture(self.timer.now_ns());
            result.environment = EnvStats::between(self.env_start, env_end);
            result.env_stable = result.environment.is_stable();
            if !result.env_stable {
                self.faults.thermal_drift = true;
            }
        }

        if self.config.collect_histogram {
            let mut histogram = Histogram::new(
                self.config.histogram_bins,
                self.config.histogram_min_ns,
                self.config.histogram_max_ns,
            )?;
            histogram.build(samples);
            result.histogram = Some(histogram);
        }

        result.benchmark_start_ns = self.benchmark_start_ns;
        result.benchmark_end_ns = self.timer.now_ns();
        result.benchmark_duration_ns = result
            .benchmark_end_ns
            .saturating_sub(result.benchmark_start_ns);
        result.timestamp_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if let Some(hasher) = &self.hasher {
            // Finalise a copy so the run stays idempotent.
            result.output_hash = hasher.clone().finalize();
            result.verification_failures = self.verification_failures;
            result.determinism_verified = self.verification_failures == 0 && !self.faults.verify_fail;
            result.result_hash = result_binding_digest(
                &result.output_hash,
                &result.platform,
                config_hash(&self.config),
                &result.latency,
                result.timestamp_unix,
            );
        }

        result.faults = self.faults;
        result.faults.merge(&stats_faults);
        Ok(result)
    }

    /// Check a finished run against a golden reference. A digest mismatch
    /// sets `verify_fail` and counts as a verification failure on
    /// subsequently assembled results.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] before the measurement phase, or when
    /// output verification was disabled.
    pub fn verify_against(&mut self, golden: &GoldenRef) -> Result<bool, Error> {
        if self.phase != Phase::Executed {
            return Err(Error::InvalidConfig("nothing to verify yet"));
        }
        let Some(hasher) = &self.hasher else {
            return Err(Error::InvalidConfig("output verification is disabled"));
        };

        let digest = hasher.clone().finalize();
        let matched = golden.matches(&digest);
        if !matched {
            self.faults.verify_fail = true;
            self.verification_failures += 1;
        }
        Ok(matched)
    }

    /// Digest of the outputs hashed so far, without finalising the run's
    /// context.
    pub fn output_digest(&self) -> Option<Digest> {
        self.hasher.as_ref().map(|h| h.clone().finalize())
    }
}

/// Hash the measurement-relevant configuration fields into the 64-bit
/// value bound by the result digest.
fn config_hash(config: &Config) -> u64 {
    let mut ctx = Sha256::new();
    for value in [
        config.warmup_iterations as u64,
        config.measure_iterations as u64,
        config.batch_size as u64,
        config.verify_outputs as u64,
    ] {
        let _ = ctx.update(&value.to_le_bytes());
    }
    let digest = ctx.finalize();
    let mut le = [0u8; 8];
    le.copy_from_slice(&digest.0[..8]);
    u64::from_le_bytes(le)
}

/// Run a complete benchmark: init, warmup, measure, assemble.
///
/// # Errors
///
/// Propagates any error from the individual phases unchanged.
pub fn run_benchmark<F>(
    config: &Config,
    mut infer: F,
    input: &[u8],
    output: &mut [u8],
    samples: &mut [u64],
) -> Result<BenchResult, Error>
where
    F: FnMut(&[u8], &mut [u8]) -> Result<(), InferenceError>,
{
    let mut runner = Runner::new(config.clone(), samples)?;
    runner.warmup(&mut infer, input, output)?;
    runner.execute(&mut infer, input, output)?;
    runner.result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::TimerSource;

    fn quick_config(iterations: u32) -> Config {
        Config {
            warmup_iterations: 5,
            measure_iterations: iterations,
            timer_source: TimerSource::Monotonic,
            monitor_environment: false,
            ..Config::default()
        }
    }

    /// Deterministic toy inference: output = input bytes, each incremented.
    fn toy_infer(input: &[u8], output: &mut [u8]) -> Result<(), InferenceError> {
        for (o, i) in output.iter_mut().zip(input.iter()) {
            *o = i.wrapping_add(1);
        }
        Ok(())
    }

    #[test]
    fn test_buffer_too_small_rejected() {
        let mut samples = [0u64; 10];
        let err = Runner::new(quick_config(100), &mut samples);
        assert!(matches!(err, Err(Error::BufferTooSmall { .. })));
    }

    #[test]
    fn test_full_run() {
        let mut samples = [0u64; 50];
        let input = [7u8; 32];
        let mut output = [0u8; 32];

        let result = run_benchmark(
            &quick_config(50),
            toy_infer,
            &input,
            &mut output,
            &mut samples,
        )
        .unwrap();

        assert!(result.is_valid());
        assert!(result.determinism_verified);
        assert_eq!(result.latency.sample_count, 50);
        assert_eq!(result.measure_iterations, 50);
        assert!(!result.output_hash.is_zero());
        assert!(!result.result_hash.is_zero());
        assert!(result.throughput.inferences_per_sec > 0);
        assert_eq!(output, [8u8; 32]);
    }

    #[test]
    fn test_output_hash_commits_to_all_iterations() {
        // Same routine, different iteration counts: different commitments.
        let input = [1u8; 16];

        let mut samples_a = [0u64; 10];
        let mut out_a = [0u8; 16];
        let a = run_benchmark(&quick_config(10), toy_infer, &input, &mut out_a, &mut samples_a)
            .unwrap();

        let mut samples_b = [0u64; 20];
        let mut out_b = [0u8; 16];
        let b = run_benchmark(&quick_config(20), toy_infer, &input, &mut out_b, &mut samples_b)
            .unwrap();

        assert!(!a.output_hash.ct_eq(&b.output_hash));
    }

    #[test]
    fn test_deterministic_routines_hash_identically() {
        let input = [3u8; 16];

        let mut samples_a = [0u64; 25];
        let mut out_a = [0u8; 16];
        let a = run_benchmark(&quick_config(25), toy_infer, &input, &mut out_a, &mut samples_a)
            .unwrap();

        let mut samples_b = [0u64; 25];
        let mut out_b = [0u8; 16];
        let b = run_benchmark(&quick_config(25), toy_infer, &input, &mut out_b, &mut samples_b)
            .unwrap();

        assert!(a.output_hash.ct_eq(&b.output_hash));
    }

    #[test]
    fn test_inference_failure_continues_loop() {
        let mut calls = 0u32;
        let flaky = |_input: &[u8], output: &mut [u8]| {
            calls += 1;
            output[0] = 9;
            if calls % 2 == 0 {
                Err(InferenceError(1))
            } else {
                Ok(())
            }
        };

        let config = Config {
            warmup_iterations: 0,
            ..quick_config(10)
        };
        let mut samples = [0u64; 10];
        let mut output = [0u8; 4];
        let result =
            run_benchmark(&config, flaky, &[0u8; 4], &mut output, &mut samples).unwrap();

        // All iterations ran, latency data exists, but the run is invalid.
        assert_eq!(result.latency.sample_count, 10);
        assert!(result.faults.verify_fail);
        assert_eq!(result.verification_failures, 5);
        assert!(!result.determinism_verified);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_warmup_failure_aborts() {
        let broken =
            |_: &[u8], _: &mut [u8]| -> Result<(), InferenceError> { Err(InferenceError(2)) };

        let mut samples = [0u64; 10];
        let mut output = [0u8; 4];
        let mut runner = Runner::new(quick_config(10), &mut samples).unwrap();
        assert!(matches!(
            runner.warmup(broken, &[0u8; 4], &mut output),
            Err(Error::Verification)
        ));
    }

    #[test]
    fn test_result_before_execute_rejected() {
        let mut samples = [0u64; 10];
        let mut runner = Runner::new(quick_config(10), &mut samples).unwrap();
        assert!(matches!(runner.result(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_execute_auto_warms() {
        let mut samples = [0u64; 10];
        let input = [1u8; 8];
        let mut output = [0u8; 8];

        let mut runner = Runner::new(quick_config(10), &mut samples).unwrap();
        runner.execute(toy_infer, &input, &mut output).unwrap();
        let result = runner.result().unwrap();
        assert_eq!(result.latency.sample_count, 10);
    }

    #[test]
    fn test_result_is_idempotent() {
        let mut samples = [0u64; 10];
        let input = [1u8; 8];
        let mut output = [0u8; 8];

        let mut runner = Runner::new(quick_config(10), &mut samples).unwrap();
        runner.execute(toy_infer, &input, &mut output).unwrap();

        let first = runner.result().unwrap();
        let second = runner.result().unwrap();
        assert_eq!(first.output_hash, second.output_hash);
        assert_eq!(first.latency, second.latency);
    }

    #[test]
    fn test_histogram_collection() {
        let config = Config {
            collect_histogram: true,
            histogram_bins: 16,
            histogram_min_ns: 0,
            histogram_max_ns: 1_000_000_000,
            ..quick_config(20)
        };

        let mut samples = [0u64; 20];
        let mut output = [0u8; 8];
        let result =
            run_benchmark(&config, toy_infer, &[0u8; 8], &mut output, &mut samples).unwrap();

        let histogram = result.histogram.expect("histogram requested");
        assert_eq!(histogram.total_count(), 20);
    }

    #[test]
    fn test_verify_disabled_leaves_hashes_zero() {
        let config = Config {
            verify_outputs: false,
            ..quick_config(10)
        };

        let mut samples = [0u64; 10];
        let mut output = [0u8; 8];
        let result =
            run_benchmark(&config, toy_infer, &[0u8; 8], &mut output, &mut samples).unwrap();

        assert!(result.output_hash.is_zero());
        assert!(result.result_hash.is_zero());
        assert!(!result.determinism_verified);
    }

    #[test]
    fn test_golden_verification() {
        let input = [5u8; 8];

        // First run records the expected digest.
        let mut samples = [0u64; 10];
        let mut output = [0u8; 8];
        let result =
            run_benchmark(&quick_config(10), toy_infer, &input, &mut output, &mut samples)
                .unwrap();
        let golden = GoldenRef::from_result(&result, 8);

        // Second identical run matches.
        let mut samples = [0u64; 10];
        let mut runner = Runner::new(quick_config(10), &mut samples).unwrap();
        runner.execute(toy_infer, &input, &mut output).unwrap();
        assert!(runner.verify_against(&golden).unwrap());
        assert!(runner.result().unwrap().is_valid());

        // A run over different input does not.
        let mut samples = [0u64; 10];
        let mut runner = Runner::new(quick_config(10), &mut samples).unwrap();
        runner
            .execute(toy_infer, &[6u8; 8], &mut output)
            .unwrap();
        assert!(!runner.verify_against(&golden).unwrap());
        let result = runner.result().unwrap();
        assert!(result.faults.verify_fail);
        assert!(!result.is_valid());
    }
}

//! Terminal output formatting for results and comparisons.

use colored::Colorize;

use crate::compare::{format_ratio_q16, Comparison};
use crate::result::BenchResult;

/// Format a benchmark result for human-readable terminal output.
pub fn format_summary(result: &BenchResult) -> String {
    let mut out = String::new();
    let sep = "\u{2550}".repeat(62);

    out.push_str(&sep);
    out.push_str("\n  Benchmark Summary\n");
    out.push_str(&sep);
    out.push_str("\n\n");

    out.push_str(&format!("Platform:    {}\n", result.platform));
    out.push_str(&format!("CPU Model:   {}\n", result.cpu_model));
    out.push_str(&format!("CPU Freq:    {} MHz\n", result.cpu_freq_mhz));
    out.push_str(&format!("Timer:       {}\n", result.timer_name));
    out.push_str(&format!(
        "Iterations:  {} warmup, {} measure (batch={})\n\n",
        result.warmup_iterations, result.measure_iterations, result.batch_size
    ));

    out.push_str("Latency:\n");
    out.push_str(&format!("  Min:        {} ns\n", group_digits(result.latency.min_ns)));
    out.push_str(&format!("  Max:        {} ns\n", group_digits(result.latency.max_ns)));
    out.push_str(&format!("  Mean:       {} ns\n", group_digits(result.latency.mean_ns)));
    out.push_str(&format!("  Median:     {} ns\n", group_digits(result.latency.median_ns)));
    out.push_str(&format!("  P95:        {} ns\n", group_digits(result.latency.p95_ns)));
    out.push_str(&format!("  P99:        {} ns\n", group_digits(result.latency.p99_ns)));
    out.push_str(&format!("  StdDev:     {} ns\n", group_digits(result.latency.stddev_ns)));
    out.push_str(&format!(
        "  WCET Bound: {} ns\n\n",
        group_digits(result.latency.wcet_bound_ns)
    ));

    out.push_str("Throughput:\n");
    out.push_str(&format!(
        "  Inferences/sec:  {}\n",
        group_digits(result.throughput.inferences_per_sec)
    ));
    out.push_str(&format!(
        "  Samples/sec:     {}\n\n",
        group_digits(result.throughput.samples_per_sec)
    ));

    out.push_str("Verification:\n");
    let verdict = if result.determinism_verified {
        "VERIFIED".green().bold().to_string()
    } else {
        "FAILED".red().bold().to_string()
    };
    out.push_str(&format!("  Determinism:     {verdict}\n"));
    out.push_str(&format!("  Failures:        {}\n", result.verification_failures));
    out.push_str(&format!("  Output Hash:     {}\n\n", result.output_hash));

    out.push_str("Faults:\n");
    if result.faults.has_hard_fault() {
        if result.faults.overflow {
            out.push_str(&format!("  - {}\n", "OVERFLOW".red()));
        }
        if result.faults.underflow {
            out.push_str(&format!("  - {}\n", "UNDERFLOW".red()));
        }
        if result.faults.div_zero {
            out.push_str(&format!("  - {}\n", "DIV_ZERO".red()));
        }
        if result.faults.timer_error {
            out.push_str(&format!("  - {}\n", "TIMER_ERROR".red()));
        }
        if result.faults.verify_fail {
            out.push_str(&format!("  - {}\n", "VERIFY_FAIL".red()));
        }
    } else {
        out.push_str("  None\n");
    }
    if result.faults.thermal_drift {
        out.push_str(&format!("  Warning: {}\n", "THERMAL_DRIFT".yellow()));
    }

    out.push_str("\nEnvironment:\n");
    out.push_str(&format!(
        "  Stable:          {}\n",
        if result.env_stable { "Yes" } else { "No" }
    ));
    out.push_str(&format!(
        "  Duration:        {} ms\n",
        group_digits(result.benchmark_duration_ns / 1_000_000)
    ));

    out.push_str(&sep);
    out.push('\n');
    out
}

/// Format a cross-platform comparison for terminal output.
pub fn format_comparison(cmp: &Comparison) -> String {
    let mut out = String::new();
    let sep = "\u{2550}".repeat(62);

    out.push_str(&sep);
    out.push_str("\n  Cross-Platform Performance Comparison\n");
    out.push_str(&format!(
        "  Reference: {:<12}  Target: {}\n",
        cmp.platform_a, cmp.platform_b
    ));
    out.push_str(&sep);
    out.push_str("\n\n");

    if !cmp.outputs_identical {
        out.push_str(&format!(
            "Bit Identity:  {} (outputs differ)\n",
            "FAILED".red().bold()
        ));
        out.push_str("\n  *** Performance comparison not meaningful ***\n\n");
        out.push_str(&sep);
        out.push('\n');
        return out;
    }

    out.push_str(&format!(
        "Bit Identity:  {} (outputs identical)\n\n",
        "VERIFIED".green().bold()
    ));

    out.push_str("Latency (p99):\n");
    out.push_str(&format!("  Diff:    {}\n", signed_ns(cmp.latency_diff_ns)));
    let direction = match cmp.latency_diff_ns {
        d if d > 0 => " slower",
        d if d < 0 => " faster",
        _ => " (equal)",
    };
    out.push_str(&format!(
        "  Ratio:   {}{}\n\n",
        format_ratio_q16(cmp.latency_ratio_q16),
        direction
    ));

    out.push_str("Throughput:\n");
    out.push_str(&format!(
        "  Diff:    {} inferences/sec\n",
        signed_count(cmp.throughput_diff)
    ));
    out.push_str(&format!(
        "  Ratio:   {}\n\n",
        format_ratio_q16(cmp.throughput_ratio_q16)
    ));

    out.push_str("WCET Bound:\n");
    out.push_str(&format!("  Diff:    {}\n", signed_ns(cmp.wcet_diff_ns)));
    out.push_str(&format!(
        "  Ratio:   {}\n\n",
        format_ratio_q16(cmp.wcet_ratio_q16)
    ));

    out.push_str(&sep);
    out.push('\n');
    out
}

/// Group an integer with thousands separators: `1234567` → `1,234,567`.
fn group_digits(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn signed_ns(value: i64) -> String {
    if value >= 0 {
        format!("+{} ns", group_digits(value as u64))
    } else {
        format!("-{} ns", group_digits(value.unsigned_abs()))
    }
}

fn signed_count(value: i64) -> String {
    if value >= 0 {
        format!("+{}", group_digits(value as u64))
    } else {
        format!("-{}", group_digits(value.unsigned_abs()))
    }
}

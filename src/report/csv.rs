//! CSV row export for regression tracking.
//!
//! One row per result, meant to be appended to a long-running log and
//! diffed by CI tooling. Integer values are written verbatim.

use crate::result::BenchResult;

/// Column header matching [`csv_row`].
pub fn csv_header() -> String {
    "timestamp_unix,platform,cpu_model,measure_iterations,batch_size,\
     min_ns,max_ns,mean_ns,median_ns,p95_ns,p99_ns,stddev_ns,\
     wcet_observed_ns,wcet_bound_ns,inferences_per_sec,samples_per_sec,\
     determinism_verified,verification_failures,output_hash,valid"
        .to_string()
}

/// Render a result as one CSV data row.
///
/// The CPU model is the only free-text field; embedded commas and quotes
/// are escaped per RFC 4180.
pub fn csv_row(result: &BenchResult) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
        result.timestamp_unix,
        result.platform,
        quote_field(&result.cpu_model),
        result.measure_iterations,
        result.batch_size,
        result.latency.min_ns,
        result.latency.max_ns,
        result.latency.mean_ns,
        result.latency.median_ns,
        result.latency.p95_ns,
        result.latency.p99_ns,
        result.latency.stddev_ns,
        result.latency.wcet_observed_ns,
        result.latency.wcet_bound_ns,
        result.throughput.inferences_per_sec,
        result.throughput.samples_per_sec,
        result.determinism_verified,
        result.verification_failures,
        result.output_hash.to_hex(),
        result.is_valid(),
    )
}

fn quote_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

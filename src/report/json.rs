//! JSON serialisation of benchmark results.
//!
//! Serialisation goes through serde with a fixed field order, so two
//! serialisations of the same record are byte-identical and integer
//! values survive byte-exactly. Hash fields serialise as 64 lowercase hex
//! characters.

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::result::BenchResult;

/// Serialise a result to a compact JSON string.
///
/// # Errors
///
/// Returns an error if serialisation fails (should not happen for
/// `BenchResult`).
pub fn to_json(result: &BenchResult) -> Result<String, serde_json::Error> {
    serde_json::to_string(result)
}

/// Serialise a result to pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialisation fails (should not happen for
/// `BenchResult`).
pub fn to_json_pretty(result: &BenchResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

/// Write a result to a JSON file.
///
/// # Errors
///
/// [`Error::Io`] on write failure; no partial writes are left behind by
/// `fs::write`.
pub fn save_json(result: &BenchResult, path: &Path) -> Result<(), Error> {
    let json = to_json_pretty(result)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a result from a JSON file. Unknown fields are ignored; absent
/// optional sections (histogram, hardware counters) stay `None`.
///
/// # Errors
///
/// [`Error::Io`] for unreadable files, [`Error::InvalidConfig`] for
/// documents that do not parse as a result record.
pub fn load_json(path: &Path) -> Result<BenchResult, Error> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|_| Error::InvalidConfig("malformed benchmark result document"))
}

//! Golden reference documents.
//!
//! A golden reference is a small JSON document committing to the expected
//! output digest of a deterministic run, used to gate later runs as
//! bit-identical or not. Only `output_hash` is mandatory; a loader that
//! meets an older or partial document fills the rest with zeros.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::hash::Digest;
use crate::result::BenchResult;

/// Format tag written into every golden document.
const GOLDEN_FORMAT: &str = "cb_golden_ref";

/// Expected reference output for a deterministic inference routine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoldenRef {
    /// Document schema version.
    pub version: String,
    /// Format tag, `cb_golden_ref`.
    pub format: String,
    /// Expected digest over all outputs, in issue order.
    pub output_hash: Digest,
    /// Expected number of outputs.
    #[serde(default)]
    pub sample_count: u32,
    /// Size of each output in bytes.
    #[serde(default)]
    pub output_size: u32,
    /// Platform that generated the reference.
    #[serde(default)]
    pub platform: String,
}

impl GoldenRef {
    /// Build a golden reference from a finished benchmark result.
    pub fn from_result(result: &BenchResult, output_size: u32) -> GoldenRef {
        GoldenRef {
            version: "1.0".to_string(),
            format: GOLDEN_FORMAT.to_string(),
            output_hash: result.output_hash,
            sample_count: result.latency.sample_count,
            output_size,
            platform: result.platform.clone(),
        }
    }

    /// Constant-time check of a computed digest against the reference.
    pub fn matches(&self, computed: &Digest) -> bool {
        self.output_hash.ct_eq(computed)
    }

    /// Load a golden reference from a JSON file.
    ///
    /// Missing optional fields are tolerated; a missing or malformed
    /// `output_hash` is not.
    ///
    /// # Errors
    ///
    /// [`Error::GoldenLoad`] for unreadable or malformed documents.
    pub fn load(path: &Path) -> Result<GoldenRef, Error> {
        let content =
            fs::read_to_string(path).map_err(|e| Error::GoldenLoad(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse a golden reference document.
    ///
    /// # Errors
    ///
    /// [`Error::GoldenLoad`] when the JSON is malformed or `output_hash`
    /// is absent.
    pub fn parse(json: &str) -> Result<GoldenRef, Error> {
        let golden: GoldenRef =
            serde_json::from_str(json).map_err(|e| Error::GoldenLoad(e.to_string()))?;
        if golden.output_hash.is_zero() {
            return Err(Error::GoldenLoad("output_hash is required".to_string()));
        }
        Ok(golden)
    }

    /// Save as pretty-printed JSON. The write is atomic per `fs::write`:
    /// either the full document lands or the call errors.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] on write failure.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::GoldenLoad(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

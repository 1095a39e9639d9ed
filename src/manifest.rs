//! Persisted-operations manifests for app deployments.
//!
//! A manifest maps document hashes to document bodies. Encounter order
//! matters: uploads are flushed in fixed-size batches in manifest
//! order, and batch error reporting refers back to buffered indexes.

use std::path::Path;

use indexmap::IndexMap;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::error::CliError;

/// Hash → document body, in file order.
pub type Manifest = IndexMap<String, String>;

/// Documents uploaded per request.
pub const UPLOAD_BATCH_SIZE: usize = 100;

/// Load and parse a manifest file. Anything but a flat JSON object of
/// string values is malformed.
pub fn load_manifest(path: &Path) -> Result<Manifest, CliError> {
    let malformed = || CliError::MalformedManifest {
        path: path.display().to_string(),
    };
    let contents = std::fs::read_to_string(path).map_err(|_| malformed())?;
    serde_json::from_str::<Manifest>(&contents).map_err(|_| malformed())
}

/// Strip an optional `sha256:` prefix and lowercase the digest.
pub fn normalize_hash(hash: &str) -> String {
    hash.strip_prefix("sha256:")
        .or_else(|| hash.strip_prefix("SHA256:"))
        .unwrap_or(hash)
        .to_ascii_lowercase()
}

fn sha256_hex(body: &str) -> String {
    let digest = Sha256::digest(body.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

/// Hash problems found during v2 verification.
#[derive(Debug, Default)]
pub struct HashIssues {
    /// Hashes that are not sha256 digests at all.
    pub invalid_format: Vec<String>,
    /// `(provided, expected)` pairs where the digest does not match the
    /// document body.
    pub mismatched: Vec<(String, String)>,
}

impl HashIssues {
    pub fn is_empty(&self) -> bool {
        self.invalid_format.is_empty() && self.mismatched.is_empty()
    }

    /// Convert to the API error the command surfaces, or `Ok` when
    /// clean. Reporting rules: first 3 invalid-format hashes, first
    /// mismatched pair with the recomputed expected value, and the
    /// `--format v1` bypass hint.
    pub fn into_error(self) -> Result<(), CliError> {
        if !self.invalid_format.is_empty() {
            let examples = self
                .invalid_format
                .iter()
                .take(3)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            let more = if self.invalid_format.len() > 3 {
                format!(" (and {} more)", self.invalid_format.len() - 3)
            } else {
                String::new()
            };
            return Err(CliError::Api {
                message: format!(
                    "Invalid hash format detected: {examples}{more}\n\
                     Hashes must be sha256 (64 hexadecimal characters, optionally prefixed with \"sha256:\").\n\
                     This is required for safe cross-version document deduplication.\n\
                     Use --format v1 to bypass this check (disables cross-version deduplication)."
                ),
                reference: None,
            });
        }

        if let Some((provided, expected)) = self.mismatched.first() {
            let more = if self.mismatched.len() > 1 {
                format!(" (and {} more)", self.mismatched.len() - 1)
            } else {
                String::new()
            };
            return Err(CliError::Api {
                message: format!(
                    "Hash does not match document content{more}.\n\
                     Provided: {provided}\n\
                     Expected: {expected}\n\
                     Ensure your manifest uses sha256 hash of the raw document body."
                ),
                reference: None,
            });
        }

        Ok(())
    }
}

/// Verify that every manifest key is a sha256 digest of its document
/// body. Used for `--format v2`; v1 accepts any hash format.
pub fn verify_sha256_hashes(manifest: &Manifest) -> HashIssues {
    let sha256_format = Regex::new(r"^(?i)(sha256:)?[a-f0-9]{64}$").unwrap();
    let mut issues = HashIssues::default();

    for (hash, body) in manifest {
        if !sha256_format.is_match(hash) {
            issues.invalid_format.push(hash.clone());
            continue;
        }
        let provided = normalize_hash(hash);
        let expected = sha256_hex(body);
        if provided != expected {
            issues.mismatched.push((provided, expected));
        }
    }

    issues
}

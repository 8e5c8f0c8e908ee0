//! Render signatures and artifact naming.
//!
//! Rendering is the expensive part of a request: decode, every operation,
//! encode. This module lets the processor skip all of it when an identical
//! request has been served before.
//!
//! # Design
//!
//! The cache has no manifest. An artifact's file name *is* its cache entry:
//!
//! ```text
//! <output_dir>/<source-stem>-<signature>.<ext>
//! ```
//!
//! A request is a hit when that file exists. Nothing is ever rewritten in
//! place; a different request produces a different name.
//!
//! ## Signatures
//!
//! The signature is SHA-256 over a JSON document of:
//!
//! - **`source_mtime`**: the effective source's modification time in whole
//!   seconds (0 when unknown). Cheap, but two different files written to the
//!   same path within one second look identical.
//! - **`operations`**: every operation key, in order. Keys embed every
//!   parameter, so changing any argument changes the signature.
//! - **`format`** and **`quality`** of the encoder.
//! - **`content_digest`**: SHA-256 of the source bytes, only when
//!   `content_digest = true` in the config. Closes the same-second gap at
//!   the cost of reading the source on every request.
//!
//! The hex digest is cut to [`SIGNATURE_LEN`] characters (48 bits).
//!
//! ## Bypassing the cache
//!
//! `force = true` in a recipe (or `--force` on the CLI) renders even when the
//! artifact exists, replacing it atomically.

use crate::imaging::{OutputFormat, Quality};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Hex characters kept from the digest.
pub const SIGNATURE_LEN: usize = 12;

/// Version of the signature input. Bump this to invalidate every existing
/// artifact when key derivation changes.
const SIGNATURE_VERSION: u32 = 1;

/// Stem used when the source path has none (e.g. `/`).
const FALLBACK_STEM: &str = "image";

/// Everything a render depends on, serialized for hashing.
#[derive(Serialize)]
struct SignatureInput<'a> {
    version: u32,
    source_mtime: u64,
    operations: &'a [String],
    format: &'a str,
    quality: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    content_digest: Option<&'a str>,
}

/// Truncated hash naming one (source state, operations, encoder) combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderSignature(String);

impl RenderSignature {
    pub fn compute(
        source_mtime: u64,
        operation_keys: &[String],
        format: OutputFormat,
        quality: Quality,
        content_digest: Option<&str>,
    ) -> Self {
        let input = SignatureInput {
            version: SIGNATURE_VERSION,
            source_mtime,
            operations: operation_keys,
            format: format.extension(),
            quality: quality.value(),
            content_digest,
        };
        // Serializing plain strings and integers cannot fail.
        let json = serde_json::to_vec(&input).unwrap_or_default();
        let digest = format!("{:x}", Sha256::digest(&json));
        Self(digest[..SIGNATURE_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Modification time in whole seconds since the epoch, 0 when unknown.
pub fn source_mtime(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Where the artifact for `source` rendered under `signature` lives.
pub fn artifact_path(
    output_dir: &Path,
    source: &Path,
    signature: &RenderSignature,
    format: OutputFormat,
) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy())
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_STEM.into());
    output_dir.join(format!("{stem}-{signature}.{}", format.extension()))
}

/// The shared placeholder used when no source is readable.
pub fn blank_path(output_dir: &Path, format: OutputFormat) -> PathBuf {
    output_dir.join(format!("blank.{}", format.extension()))
}

/// Whether a render was served from disk or produced now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Rendered,
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hit => "cached",
            Self::Rendered => "rendered",
        })
    }
}

/// Summary of cache performance over several renders.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn record(&mut self, outcome: CacheOutcome) {
        match outcome {
            CacheOutcome::Hit => self.hits += 1,
            CacheOutcome::Rendered => self.misses += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}

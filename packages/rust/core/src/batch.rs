//! Fixed-size partitioning of a record sequence into numbered batches.
//!
//! Batch `k` (1-based) holds positions `[(k-1)*B, min(k*B, N))`. Batching is
//! content-agnostic and never merges a short final batch into its neighbour.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Minimum number of digits in a batch file index.
pub const MIN_INDEX_WIDTH: usize = 2;

/// A contiguous, order-preserving view over part of a record sequence.
#[derive(Debug, Clone)]
pub struct Batch<'a, T> {
    /// 1-based position of this batch.
    pub index: usize,
    pub records: &'a [T],
}

/// Number of batches needed for `len` records: `ceil(len / size)`.
pub fn batch_count(len: usize, size: NonZeroUsize) -> usize {
    len.div_ceil(size.get())
}

/// Split `records` into consecutive batches of `size` (the last may be shorter).
///
/// An empty input yields no batches.
pub fn partition<T>(records: &[T], size: NonZeroUsize) -> Vec<Batch<'_, T>> {
    records
        .chunks(size.get())
        .enumerate()
        .map(|(i, records)| Batch {
            index: i + 1,
            records,
        })
        .collect()
}

/// Zero-padding width for batch indexes, so lexicographic file order equals
/// numeric order for every index up to `count`.
pub fn index_width(count: usize) -> usize {
    let digits = count.checked_ilog10().map_or(1, |d| d as usize + 1);
    digits.max(MIN_INDEX_WIDTH)
}

/// `<prefix>_<index>.json`, with the index zero-padded to `width`.
pub fn batch_file_name(prefix: &str, index: usize, width: usize) -> String {
    format!("{prefix}_{index:0width$}.json")
}

/// Index of `name` if it is a batch file for `prefix` (`<prefix>_<digits>.json`),
/// whatever its padding width.
pub fn parse_batch_file_name(prefix: &str, name: &str) -> Option<usize> {
    let digits = name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(".json")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Name of the run manifest written next to the batch files.
///
/// Matches neither the batch pattern nor a `<prefix>_*.json` glob.
pub fn manifest_file_name(prefix: &str) -> String {
    format!("{prefix}.manifest.json")
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Summary of one split run, written as `<prefix>.manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchManifest {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Distilled collection the batches were cut from.
    pub source: PathBuf,
    pub batch_size: usize,
    pub total_records: usize,
    pub batches: Vec<BatchManifestEntry>,
}

/// One batch file listed in a [`BatchManifest`].
#[derive(Debug, Clone, Serialize)]
pub struct BatchManifestEntry {
    pub index: usize,
    pub filename: String,
    pub records: usize,
    pub sha256: String,
    pub size_bytes: usize,
}

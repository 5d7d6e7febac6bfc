//! JSON artifact I/O for bookmarkprep.
//!
//! Every pipeline stage reads a single JSON array and writes one or more
//! pretty-printed JSON arrays. Writes go to a hidden temp file in the target
//! directory and are renamed into place, so a failed run never leaves a
//! truncated artifact under its final name.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use bookmarkprep_shared::{BookmarkPrepError, Result};

/// Metadata for a single written artifact file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactMeta {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: usize,
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Read a JSON array from `path`, keeping each element as an untyped value.
///
/// Pretty-printed and compact encodings parse identically. Object key order
/// is preserved. Content that is not UTF-8 is malformed input.
pub fn read_json_array(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read(path).map_err(|e| BookmarkPrepError::read(path, e))?;

    let value: Value = serde_json::from_slice(&content)
        .map_err(|e| BookmarkPrepError::malformed(path, format!("invalid JSON: {e}")))?;

    match value {
        Value::Array(items) => {
            debug!(path = %path.display(), count = items.len(), "read JSON array");
            Ok(items)
        }
        other => Err(BookmarkPrepError::malformed(
            path,
            format!("expected a JSON array, found {}", json_kind(&other)),
        )),
    }
}

/// Decode one element of an array read from `path`.
///
/// The error names the zero-based record index so the operator can find the
/// offending record.
pub fn decode_record<T: DeserializeOwned>(path: &Path, index: usize, value: &Value) -> Result<T> {
    <T as serde::Deserialize>::deserialize(value)
        .map_err(|e| BookmarkPrepError::malformed(path, format!("record {index}: {e}")))
}

/// Read a JSON array from `path` and decode every element as `T`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    read_json_array(path)?
        .iter()
        .enumerate()
        .map(|(i, value)| decode_record(path, i, value))
        .collect()
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `data` as pretty-printed JSON (2-space indent, literal non-ASCII).
///
/// The parent directory must already exist.
pub fn write_json_pretty<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<ArtifactMeta> {
    let json = serde_json::to_string_pretty(data).map_err(|e| {
        BookmarkPrepError::validation(format!("JSON serialization failed: {e}"))
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            BookmarkPrepError::validation(format!("not a file path: {}", path.display()))
        })?;
    let temp = path.with_file_name(format!(".{filename}.tmp"));

    std::fs::write(&temp, &json).map_err(|e| BookmarkPrepError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| BookmarkPrepError::io(path, e))?;

    debug!(path = %path.display(), size = json.len(), "wrote JSON artifact");

    Ok(ArtifactMeta {
        filename,
        sha256: sha256_hex(json.as_bytes()),
        size_bytes: json.len(),
    })
}

/// Create `dir` and any missing parents. Succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| BookmarkPrepError::io(dir, e))
}

/// Create the parent directory of `path`, if it has one.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Byte length of the compact JSON encoding of `value`.
pub fn compact_len<T: Serialize + ?Sized>(value: &T) -> Result<usize> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(|e| BookmarkPrepError::validation(format!("JSON serialization failed: {e}")))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

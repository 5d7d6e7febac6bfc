//! End-to-end runs: export → distilled collection, distilled collection → batches.
//!
//! Each run reads its input in full, writes its artifacts, and either
//! completes or fails outright. There is no checkpointing; a failed run is
//! restarted from the beginning.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use bookmarkprep_artifacts::{
    ArtifactMeta, ensure_dir, ensure_parent, read_json_array, write_json_pretty,
};
use bookmarkprep_shared::{BatchingConfig, BookmarkPrepError, Result};

use crate::batch::{
    BatchManifest, BatchManifestEntry, batch_file_name, index_width, manifest_file_name,
    parse_batch_file_name, partition,
};
use crate::distill::{distill_all, reduction_pct};

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each batch file is written.
    fn batch_written(&self, batch: &WrittenBatch, total: usize);
    /// Called when the run completes successfully.
    fn finish(&self);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn batch_written(&self, _batch: &WrittenBatch, _total: usize) {}
    fn finish(&self) {}
}

// ---------------------------------------------------------------------------
// Distill
// ---------------------------------------------------------------------------

/// Configuration for a distillation run.
#[derive(Debug, Clone)]
pub struct DistillConfig {
    /// Raw bookmark export.
    pub input: PathBuf,
    /// Destination of the distilled collection. Missing parent directories
    /// are created.
    pub output: PathBuf,
}

/// Result of a distillation run.
#[derive(Debug, Clone)]
pub struct DistillResult {
    pub record_count: usize,
    /// Sum of compact-JSON byte lengths of the source records.
    pub original_bytes: usize,
    /// Sum of compact-JSON byte lengths of the distilled records.
    pub distilled_bytes: usize,
    pub output: PathBuf,
    pub artifact: ArtifactMeta,
    pub elapsed: Duration,
}

impl DistillResult {
    /// Size reduction as a percentage of the original size.
    pub fn reduction_pct(&self) -> f64 {
        reduction_pct(self.original_bytes, self.distilled_bytes)
    }
}

/// Distill a raw export into the canonical collection.
#[instrument(skip_all, fields(input = %config.input.display(), output = %config.output.display()))]
pub fn distill(config: &DistillConfig, progress: &dyn ProgressReporter) -> Result<DistillResult> {
    let start = Instant::now();

    progress.phase("Reading export");
    let values = read_json_array(&config.input)?;
    info!(count = values.len(), "loaded raw bookmarks");

    progress.phase("Distilling records");
    let distilled = distill_all(&config.input, &values)?;

    progress.phase("Writing distilled collection");
    ensure_parent(&config.output)?;
    let artifact = write_json_pretty(&config.output, &distilled.records)?;

    let result = DistillResult {
        record_count: distilled.records.len(),
        original_bytes: distilled.original_bytes,
        distilled_bytes: distilled.distilled_bytes,
        output: config.output.clone(),
        artifact,
        elapsed: start.elapsed(),
    };

    info!(
        records = result.record_count,
        original_bytes = result.original_bytes,
        distilled_bytes = result.distilled_bytes,
        reduction_pct = result.reduction_pct(),
        "distillation complete"
    );
    progress.finish();

    Ok(result)
}

// ---------------------------------------------------------------------------
// Split
// ---------------------------------------------------------------------------

/// Configuration for a batch split run.
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Distilled collection to partition.
    pub input: PathBuf,
    /// Directory receiving the batch files. Created if absent.
    pub out_dir: PathBuf,
    pub batching: BatchingConfig,
}

/// One batch file written by [`split`].
#[derive(Debug, Clone)]
pub struct WrittenBatch {
    /// 1-based batch position.
    pub index: usize,
    pub records: usize,
    pub path: PathBuf,
    pub artifact: ArtifactMeta,
}

/// Result of a batch split run.
#[derive(Debug, Clone)]
pub struct SplitResult {
    pub total_records: usize,
    pub batch_size: usize,
    pub out_dir: PathBuf,
    /// Written batches in index order.
    pub batches: Vec<WrittenBatch>,
    /// Batch files for the same prefix left over from an earlier run, now deleted.
    pub removed_stale: Vec<PathBuf>,
    /// Path of the run manifest, when one was written.
    pub manifest: Option<PathBuf>,
    pub elapsed: Duration,
}

/// Partition a distilled collection into numbered batch files.
///
/// Records are copied verbatim, so any JSON array can be split. Existing
/// files with the same names are overwritten, and once every batch is written
/// any other `<prefix>_<digits>.json` file in the directory is deleted, so the
/// directory holds exactly one run's batches. An empty input writes no batch
/// files.
#[instrument(
    skip_all,
    fields(input = %config.input.display(), out_dir = %config.out_dir.display())
)]
pub fn split(config: &SplitConfig, progress: &dyn ProgressReporter) -> Result<SplitResult> {
    let start = Instant::now();

    config.batching.validate()?;
    let size = NonZeroUsize::new(config.batching.batch_size)
        .ok_or_else(|| BookmarkPrepError::config("batch_size must be at least 1"))?;
    let prefix = config.batching.file_prefix.as_str();

    progress.phase("Reading distilled collection");
    let records = read_json_array(&config.input)?;

    ensure_dir(&config.out_dir)?;

    let batches = partition(&records, size);
    let width = index_width(batches.len());
    info!(
        total = records.len(),
        batch_size = size.get(),
        batches = batches.len(),
        "splitting into batches"
    );

    progress.phase("Writing batches");
    let mut written = Vec::with_capacity(batches.len());
    for batch in &batches {
        let path = config
            .out_dir
            .join(batch_file_name(prefix, batch.index, width));
        let artifact = write_json_pretty(&path, batch.records)?;

        let entry = WrittenBatch {
            index: batch.index,
            records: batch.records.len(),
            path,
            artifact,
        };
        debug!(
            index = entry.index,
            records = entry.records,
            path = %entry.path.display(),
            "wrote batch"
        );
        progress.batch_written(&entry, batches.len());
        written.push(entry);
    }

    let removed_stale = remove_stale_batches(&config.out_dir, prefix, &written)?;
    if !removed_stale.is_empty() {
        info!(count = removed_stale.len(), "removed stale batch files");
    }

    let manifest = if config.batching.write_manifest {
        let path = config.out_dir.join(manifest_file_name(prefix));
        let manifest = build_manifest(config, size.get(), records.len(), &written);
        write_json_pretty(&path, &manifest)?;
        debug!(path = %path.display(), "wrote batch manifest");
        Some(path)
    } else {
        None
    };

    let result = SplitResult {
        total_records: records.len(),
        batch_size: size.get(),
        out_dir: config.out_dir.clone(),
        batches: written,
        removed_stale,
        manifest,
        elapsed: start.elapsed(),
    };

    info!(batches = result.batches.len(), "split complete");
    progress.finish();

    Ok(result)
}

/// Delete `<prefix>_<digits>.json` files in `dir` that this run did not write.
fn remove_stale_batches(
    dir: &Path,
    prefix: &str,
    written: &[WrittenBatch],
) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| BookmarkPrepError::io(dir, e))?;

    let mut removed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BookmarkPrepError::io(dir, e))?;
        let path = entry.path();
        let is_file = entry
            .file_type()
            .map_err(|e| BookmarkPrepError::io(&path, e))?
            .is_file();
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        if !is_file
            || parse_batch_file_name(prefix, name).is_none()
            || written.iter().any(|b| b.artifact.filename == name)
        {
            continue;
        }

        std::fs::remove_file(&path).map_err(|e| BookmarkPrepError::io(&path, e))?;
        debug!(path = %path.display(), "removed stale batch");
        removed.push(path);
    }

    removed.sort();
    Ok(removed)
}

fn build_manifest(
    config: &SplitConfig,
    batch_size: usize,
    total_records: usize,
    written: &[WrittenBatch],
) -> BatchManifest {
    BatchManifest {
        run_id: Uuid::now_v7(),
        created_at: Utc::now(),
        source: config.input.clone(),
        batch_size,
        total_records,
        batches: written
            .iter()
            .map(|b| BatchManifestEntry {
                index: b.index,
                filename: b.artifact.filename.clone(),
                records: b.records,
                sha256: b.artifact.sha256.clone(),
                size_bytes: b.artifact.size_bytes,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use bookmarkprep_shared::CANONICAL_FIELDS;

    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bmp-pipeline-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_export(path: &Path, count: usize) {
        let records: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "tweet_url": format!("https://x.com/u/status/{i}"),
                    "screen_name": "u",
                    "name": "Ünïcödé 名前",
                    "full_text": format!("post {i}"),
                    "tweeted_at": "2026-01-12T09:00:00Z",
                    "bookmark_date": "2026-01-13T15:28:03Z",
                    "profile_image_url_https": "https://pbs.example.com/u.jpg",
                    "extended_media": [{ "type": "photo", "expanded_url": "https://x.com/p" }]
                })
            })
            .collect();
        std::fs::write(path, serde_json::to_string(&records).unwrap()).unwrap();
    }

    fn split_config(input: &Path, out_dir: &Path, batch_size: usize) -> SplitConfig {
        SplitConfig {
            input: input.into(),
            out_dir: out_dir.into(),
            batching: BatchingConfig {
                batch_size,
                ..BatchingConfig::default()
            },
        }
    }

    fn batch_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("batch_"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn distill_writes_canonical_collection() {
        let dir = temp_dir();
        let input = dir.join("export.json");
        let output = dir.join("distilled").join("bookmarks_distilled.json");
        write_export(&input, 3);

        let result = distill(
            &DistillConfig {
                input: input.clone(),
                output: output.clone(),
            },
            &SilentProgress,
        )
        .unwrap();

        assert_eq!(result.record_count, 3);
        assert!(result.distilled_bytes < result.original_bytes);
        assert!(result.reduction_pct() > 0.0);

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("Ünïcödé 名前"));
        let parsed: Vec<Value> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed.len(), 3);
        let keys: Vec<&str> = parsed[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(keys, CANONICAL_FIELDS);
        assert_eq!(parsed[2]["tweet_url"], "https://x.com/u/status/2");
        assert_eq!(parsed[0]["media_type"], "image");
        assert_eq!(parsed[0]["bookmark_date"], "2026-01-13");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn distill_missing_input_fails() {
        let dir = temp_dir();
        let err = distill(
            &DistillConfig {
                input: dir.join("absent.json"),
                output: dir.join("out.json"),
            },
            &SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, BookmarkPrepError::InputNotFound { .. }));
        assert!(!dir.join("out.json").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn distill_malformed_input_fails() {
        let dir = temp_dir();
        let input = dir.join("export.json");
        std::fs::write(&input, "not json").unwrap();
        let err = distill(
            &DistillConfig {
                input,
                output: dir.join("out.json"),
            },
            &SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, BookmarkPrepError::Malformed { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn distill_empty_export() {
        let dir = temp_dir();
        let input = dir.join("export.json");
        std::fs::write(&input, "[]").unwrap();
        let output = dir.join("out.json");

        let result = distill(
            &DistillConfig {
                input,
                output: output.clone(),
            },
            &SilentProgress,
        )
        .unwrap();

        assert_eq!(result.record_count, 0);
        assert_eq!(result.reduction_pct(), 0.0);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "[]");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_125_into_three_batches() {
        let dir = temp_dir();
        let export = dir.join("export.json");
        let distilled = dir.join("distilled.json");
        let out_dir = dir.join("batches");
        write_export(&export, 125);
        distill(
            &DistillConfig {
                input: export,
                output: distilled.clone(),
            },
            &SilentProgress,
        )
        .unwrap();

        let result = split(&split_config(&distilled, &out_dir, 50), &SilentProgress).unwrap();

        let sizes: Vec<usize> = result.batches.iter().map(|b| b.records).collect();
        assert_eq!(sizes, vec![50, 50, 25]);
        assert_eq!(result.total_records, 125);
        assert_eq!(
            batch_files(&out_dir),
            ["batch_01.json", "batch_02.json", "batch_03.json"]
        );

        let original: Vec<Value> =
            serde_json::from_str(&std::fs::read_to_string(&distilled).unwrap()).unwrap();
        let mut rejoined: Vec<Value> = Vec::new();
        for name in batch_files(&out_dir) {
            let batch: Vec<Value> =
                serde_json::from_str(&std::fs::read_to_string(out_dir.join(name)).unwrap())
                    .unwrap();
            rejoined.extend(batch);
        }
        assert_eq!(rejoined, original);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_writes_manifest() {
        let dir = temp_dir();
        let input = dir.join("distilled.json");
        std::fs::write(&input, r#"[{"a":1},{"a":2},{"a":3}]"#).unwrap();
        let out_dir = dir.join("batches");

        let result = split(&split_config(&input, &out_dir, 2), &SilentProgress).unwrap();

        let manifest_path = result.manifest.expect("manifest written");
        assert_eq!(manifest_path, out_dir.join("batch.manifest.json"));
        let manifest: Value =
            serde_json::from_str(&std::fs::read_to_string(&manifest_path).unwrap()).unwrap();
        assert_eq!(manifest["total_records"], 3);
        assert_eq!(manifest["batch_size"], 2);
        assert_eq!(manifest["batches"][0]["filename"], "batch_01.json");
        assert_eq!(manifest["batches"][1]["records"], 1);
        assert_eq!(
            manifest["batches"][0]["sha256"],
            result.batches[0].artifact.sha256.as_str()
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_without_manifest() {
        let dir = temp_dir();
        let input = dir.join("distilled.json");
        std::fs::write(&input, r#"[{"a":1}]"#).unwrap();
        let out_dir = dir.join("batches");
        let mut config = split_config(&input, &out_dir, 50);
        config.batching.write_manifest = false;

        let result = split(&config, &SilentProgress).unwrap();

        assert!(result.manifest.is_none());
        assert!(!out_dir.join("batch.manifest.json").exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_twice_into_existing_dir() {
        let dir = temp_dir();
        let input = dir.join("distilled.json");
        std::fs::write(&input, r#"[{"a":1},{"a":2},{"a":3}]"#).unwrap();
        let out_dir = dir.join("nested").join("batches");
        let config = split_config(&input, &out_dir, 2);

        split(&config, &SilentProgress).unwrap();
        let second = split(&config, &SilentProgress).unwrap();

        assert_eq!(second.batches.len(), 2);
        assert_eq!(batch_files(&out_dir), ["batch_01.json", "batch_02.json"]);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn narrower_rerun_removes_stale_batches() {
        let dir = temp_dir();
        let out_dir = dir.join("batches");

        let wide = dir.join("wide.json");
        let records: Vec<Value> = (0..120).map(|i| json!({ "n": i })).collect();
        std::fs::write(&wide, serde_json::to_string(&records).unwrap()).unwrap();
        let first = split(&split_config(&wide, &out_dir, 1), &SilentProgress).unwrap();
        assert_eq!(first.batches.len(), 120);
        assert_eq!(batch_files(&out_dir)[0], "batch_001.json");

        std::fs::write(out_dir.join("notes.json"), "[]").unwrap();
        std::fs::write(out_dir.join("chunk_01.json"), "[]").unwrap();

        let narrow = dir.join("narrow.json");
        std::fs::write(&narrow, r#"[{"n":0},{"n":1},{"n":2}]"#).unwrap();
        let second = split(&split_config(&narrow, &out_dir, 1), &SilentProgress).unwrap();

        assert_eq!(second.removed_stale.len(), 120);
        assert_eq!(
            batch_files(&out_dir),
            ["batch_01.json", "batch_02.json", "batch_03.json"]
        );
        assert!(out_dir.join("notes.json").exists());
        assert!(out_dir.join("chunk_01.json").exists());
        assert!(out_dir.join("batch.manifest.json").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_empty_input_writes_no_batches() {
        let dir = temp_dir();
        let input = dir.join("distilled.json");
        std::fs::write(&input, "[]").unwrap();
        let out_dir = dir.join("batches");

        let result = split(&split_config(&input, &out_dir, 50), &SilentProgress).unwrap();

        assert!(result.batches.is_empty());
        assert!(out_dir.is_dir());
        assert!(batch_files(&out_dir).is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_rejects_zero_batch_size() {
        let dir = temp_dir();
        let input = dir.join("distilled.json");
        std::fs::write(&input, "[]").unwrap();
        let out_dir = dir.join("batches");

        let err = split(&split_config(&input, &out_dir, 0), &SilentProgress).unwrap_err();

        assert!(matches!(err, BookmarkPrepError::Config { .. }));
        assert!(!out_dir.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_missing_input_fails() {
        let dir = temp_dir();
        let err = split(
            &split_config(&dir.join("absent.json"), &dir.join("batches"), 50),
            &SilentProgress,
        )
        .unwrap_err();
        assert!(matches!(err, BookmarkPrepError::InputNotFound { .. }));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn split_keeps_record_key_order() {
        let dir = temp_dir();
        let input = dir.join("distilled.json");
        std::fs::write(&input, r#"[{"tweet_url":"a","author":"b","subtags":[]}]"#).unwrap();
        let out_dir = dir.join("batches");

        split(&split_config(&input, &out_dir, 50), &SilentProgress).unwrap();

        let written = std::fs::read_to_string(out_dir.join("batch_01.json")).unwrap();
        assert_eq!(
            written,
            "[\n  {\n    \"tweet_url\": \"a\",\n    \"author\": \"b\",\n    \"subtags\": []\n  }\n]"
        );
        std::fs::remove_dir_all(&dir).ok();
    }
}

//! Application configuration for bookmarkprep.
//!
//! User config lives at `~/.bookmarkprep/bookmarkprep.toml`.
//! CLI flags override environment variables, which override config file
//! values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BookmarkPrepError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "bookmarkprep.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".bookmarkprep";

// ---------------------------------------------------------------------------
// Config structs (matching bookmarkprep.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Input and output locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Batch partitioning settings.
    #[serde(default)]
    pub batching: BatchingConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw bookmark export read by the distiller.
    #[serde(default = "default_export_file")]
    pub export_file: PathBuf,

    /// Distilled collection written by the distiller and read by the batcher.
    #[serde(default = "default_distilled_file")]
    pub distilled_file: PathBuf,

    /// Directory receiving batch files.
    #[serde(default = "default_batch_dir")]
    pub batch_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            export_file: default_export_file(),
            distilled_file: default_distilled_file(),
            batch_dir: default_batch_dir(),
        }
    }
}

fn default_export_file() -> PathBuf {
    PathBuf::from("data/exports/bookmarks.json")
}
fn default_distilled_file() -> PathBuf {
    PathBuf::from("data/distilled/bookmarks_distilled.json")
}
fn default_batch_dir() -> PathBuf {
    PathBuf::from("data/distilled/batches")
}

/// `[batching]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchingConfig {
    /// Maximum records per batch file.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Common prefix of batch file names (`<prefix>_01.json`, ...).
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Whether to write `<prefix>.manifest.json` next to the batches.
    #[serde(default = "default_true")]
    pub write_manifest: bool,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            file_prefix: default_file_prefix(),
            write_manifest: true,
        }
    }
}

fn default_batch_size() -> usize {
    50
}
fn default_file_prefix() -> String {
    "batch".into()
}
fn default_true() -> bool {
    true
}

impl BatchingConfig {
    /// Reject settings that would produce no batches or unsafe file names.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(BookmarkPrepError::config("batch_size must be at least 1"));
        }
        if self.file_prefix.is_empty() {
            return Err(BookmarkPrepError::config("file_prefix must not be empty"));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(BookmarkPrepError::config(format!(
                "file_prefix '{}' must not contain path separators",
                self.file_prefix
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.bookmarkprep/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BookmarkPrepError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.bookmarkprep/bookmarkprep.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BookmarkPrepError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BookmarkPrepError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BookmarkPrepError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BookmarkPrepError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BookmarkPrepError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

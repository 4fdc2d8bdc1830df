//! User configuration loading from `~/.powerfeed/config.toml`.

use crate::dedup::DEFAULT_SIMILARITY_THRESHOLD;
use crate::thread::{DEFAULT_MAX_COMMENT_DEPTH, DEFAULT_MAX_COMMENT_LENGTH};
use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".powerfeed";
const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CONFIG_TOML: &str = r##"# powerfeed configuration

[dedup]
# Similarity (0.0 to 1.0) at or above which a generated title counts as a duplicate.
threshold = 0.7

[comments]
# Replies are offered only on comments shallower than this depth.
max_depth = 5
max_length = 2000
"##;

/// Application configuration loaded from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub dedup_threshold: f64,
    pub max_comment_depth: usize,
    pub max_comment_length: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dedup_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            max_comment_depth: DEFAULT_MAX_COMMENT_DEPTH,
            max_comment_length: DEFAULT_MAX_COMMENT_LENGTH,
        }
    }
}

/// Returns the config file path and creates default config if missing.
pub fn ensure_config_file() -> Result<PathBuf> {
    let path = config_path()?;
    ensure_default_config(&path)?;
    Ok(path)
}

/// Loads configuration from `~/.powerfeed/config.toml`, creating defaults if missing.
pub fn load_or_create() -> Result<AppConfig> {
    let path = ensure_config_file()?;
    load_from_path(&path)
}

/// Loads configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;

    let raw: RawConfig = toml::from_str(&content)
        .with_context(|| format!("failed to parse TOML in {}", path.display()))?;
    raw.into_config()
}

fn config_path() -> Result<PathBuf> {
    let home =
        env::var_os("HOME").ok_or_else(|| anyhow!("HOME environment variable is not set"))?;
    Ok(PathBuf::from(home).join(CONFIG_DIR).join(CONFIG_FILE))
}

fn ensure_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }

    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("invalid config path: {}", path.display()))?;
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    fs::write(path, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("failed to write default config file {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote default config");
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawConfig {
    dedup: RawDedup,
    comments: RawComments,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDedup {
    threshold: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawComments {
    max_depth: Option<usize>,
    max_length: Option<usize>,
}

/// Accepts similarity thresholds in `0.0..=1.0`; rejects NaN.
pub fn check_threshold(threshold: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(anyhow!("{threshold} is outside 0.0 to 1.0"))
    }
}

impl RawConfig {
    fn into_config(self) -> Result<AppConfig> {
        let defaults = AppConfig::default();

        let dedup_threshold = check_threshold(
            self.dedup.threshold.unwrap_or(defaults.dedup_threshold),
        )
        .context("invalid value for `dedup.threshold`")?;

        let max_comment_length = self
            .comments
            .max_length
            .unwrap_or(defaults.max_comment_length);
        if max_comment_length == 0 {
            return Err(anyhow!("`comments.max_length` must be greater than zero"));
        }

        Ok(AppConfig {
            dedup_threshold,
            max_comment_depth: self
                .comments
                .max_depth
                .unwrap_or(defaults.max_comment_depth),
            max_comment_length,
        })
    }
}

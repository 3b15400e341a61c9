//! Configuration loading and parsing.
//!
//! Parses `hexed.toml` (or an override path provided by the embedding
//! application) for the block cache and save tuning knobs. Unknown fields
//! are ignored so the file can grow without breaking older builds, and a
//! missing or malformed file falls back to defaults; a config problem
//! must never stop a file from opening.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::info;

/// Default size of one cached block, in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 1024;
/// Default number of cache slots.
pub const DEFAULT_MAX_BLOCKS: usize = 8;
/// Default chunk size for on-disk shifts at save time.
pub const DEFAULT_CHUNK_SIZE: usize = 120;

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_block_size")]
    pub block_size: usize,
    #[serde(default = "CacheConfig::default_max_blocks")]
    pub max_blocks: usize,
}

impl CacheConfig {
    const fn default_block_size() -> usize {
        DEFAULT_BLOCK_SIZE
    }
    const fn default_max_blocks() -> usize {
        DEFAULT_MAX_BLOCKS
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            block_size: Self::default_block_size(),
            max_blocks: Self::default_max_blocks(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SaveConfig {
    #[serde(default = "SaveConfig::default_chunk_size")]
    pub chunk_size: usize,
}

impl SaveConfig {
    const fn default_chunk_size() -> usize {
        DEFAULT_CHUNK_SIZE
    }
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            chunk_size: Self::default_chunk_size(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub save: SaveConfig,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Original file string, when one was read.
    pub raw: Option<String>,
    /// Parsed (or default) data.
    pub file: ConfigFile,
}

/// Best-effort config path: prefer a `hexed.toml` in the working
/// directory, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("hexed.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("hexed").join("hexed.toml");
    }
    PathBuf::from("hexed.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    if let Ok(content) = fs::read_to_string(&path) {
        match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Config {
                raw: Some(content),
                file,
            }),
            Err(e) => {
                // Parse errors fall back to defaults rather than failing.
                info!(target: "config", ?e, path = %path.display(), "config_parse_failed");
                Ok(Config::default())
            }
        }
    } else {
        Ok(Config::default())
    }
}

impl Config {
    /// Cache and save knobs with zero values clamped up to their minimums
    /// (a zero block size or chunk size cannot drive the math downstream).
    pub fn effective(&self) -> (usize, usize, usize) {
        let block_size = clamp_min(self.file.cache.block_size, 1, "cache.block_size");
        let max_blocks = clamp_min(self.file.cache.max_blocks, 1, "cache.max_blocks");
        let chunk_size = clamp_min(self.file.save.chunk_size, 1, "save.chunk_size");
        (block_size, max_blocks, chunk_size)
    }
}

fn clamp_min(raw: usize, min: usize, key: &'static str) -> usize {
    if raw < min {
        info!(target: "config", raw, min, key, "config_value_clamped");
        min
    } else {
        raw
    }
}

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::checkpoint::Checkpoint;

/// Global configuration loaded from `~/.config/txpull/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullConfig {
    /// Bucket to pull from. Empty until the user fills it in; `sync` refuses
    /// to run with an empty bucket.
    #[serde(default)]
    pub bucket: String,
    /// Only objects whose name ends with this suffix are pulled.
    #[serde(default = "default_object_suffix")]
    pub object_suffix: String,
    /// Directory downloads land in (created if absent).
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,
    /// Downloads smaller than this many bytes fail validation.
    #[serde(default = "default_min_object_bytes")]
    pub min_object_bytes: u64,
    /// Rows covered by the shallow CSV check.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: usize,
    /// Optional file holding an OAuth2 bearer token for the storage API.
    #[serde(default)]
    pub credentials_file: Option<PathBuf>,
    /// Optional project to bill storage requests to (`x-goog-user-project`).
    #[serde(default)]
    pub user_project: Option<String>,
    /// Override for the checkpoint file location.
    #[serde(default)]
    pub checkpoint_file: Option<PathBuf>,
}

fn default_object_suffix() -> String {
    "transactions.csv".to_string()
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_min_object_bytes() -> u64 {
    100 * 1024
}

fn default_preview_rows() -> usize {
    5
}

impl Default for PullConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            object_suffix: default_object_suffix(),
            download_dir: default_download_dir(),
            min_object_bytes: default_min_object_bytes(),
            preview_rows: default_preview_rows(),
            credentials_file: None,
            user_project: None,
            checkpoint_file: None,
        }
    }
}

impl PullConfig {
    /// Checkpoint location: the configured override or the XDG default.
    pub fn checkpoint_path(&self) -> Result<PathBuf> {
        match &self.checkpoint_file {
            Some(path) => Ok(path.clone()),
            None => Checkpoint::default_path(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("txpull")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<PullConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = PullConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: PullConfig = toml::from_str(&data)?;
    Ok(cfg)
}

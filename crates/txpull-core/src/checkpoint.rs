//! Persistent checkpoint of already-downloaded object names.
//!
//! Stored as a JSON array of strings under the XDG state dir so repeated runs
//! skip prior work. Names that fail validation are never recorded, so the
//! next run retries them.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The set of object names already downloaded and validated, plus the names
/// recorded by the current run.
#[derive(Debug, Default)]
pub struct Checkpoint {
    entries: BTreeSet<String>,
    added: Vec<String>,
}

impl Checkpoint {
    /// Default checkpoint location: `~/.local/state/txpull/downloaded.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("txpull")?;
        Ok(xdg_dirs.get_state_home().join("downloaded.json"))
    }

    /// Load from `path`. A missing file yields an empty checkpoint; any other
    /// read or parse failure propagates.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("read checkpoint: {}", path.display()))
            }
        };
        let names: Vec<String> = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse checkpoint: {}", path.display()))?;
        Ok(Self {
            entries: names.into_iter().collect(),
            added: Vec::new(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains(name)
    }

    /// Record a validated download. Returns false (and records nothing) if
    /// the name was already present.
    pub fn record(&mut self, name: &str) -> bool {
        if self.entries.insert(name.to_string()) {
            self.added.push(name.to_string());
            true
        } else {
            false
        }
    }

    /// Names recorded by this run, in download order.
    pub fn newly_recorded(&self) -> &[String] {
        &self.added
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All known names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Write the checkpoint back only if this run recorded new names, so a
    /// run with nothing new leaves the file byte-identical. Returns whether a
    /// write happened.
    pub fn save_if_new(&self, path: &Path) -> Result<bool> {
        if self.added.is_empty() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let names: Vec<&str> = self.entries.iter().map(String::as_str).collect();
        let json = serde_json::to_string_pretty(&names).context("serialize checkpoint")?;
        std::fs::write(path, json)
            .with_context(|| format!("write checkpoint: {}", path.display()))?;
        Ok(true)
    }
}

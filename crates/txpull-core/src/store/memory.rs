//! In-memory `ObjectStore` for tests.

use anyhow::{bail, Context, Result};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use super::{ObjectStore, RemoteObject};

/// Preloaded name-to-bytes store that records every fetch, so tests can
/// assert which objects were actually downloaded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: BTreeMap<String, Vec<u8>>,
    fetched: RefCell<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.objects.insert(name.into(), content.into());
    }

    /// Names fetched through this store, in call order.
    pub fn fetch_log(&self) -> Vec<String> {
        self.fetched.borrow().clone()
    }
}

impl ObjectStore for MemoryStore {
    fn list(&self) -> Result<Vec<RemoteObject>> {
        Ok(self
            .objects
            .iter()
            .map(|(name, bytes)| RemoteObject {
                name: name.clone(),
                size: Some(bytes.len() as u64),
            })
            .collect())
    }

    fn fetch_to_path(&self, name: &str, dest: &Path) -> Result<u64> {
        self.fetched.borrow_mut().push(name.to_string());
        let Some(bytes) = self.objects.get(name) else {
            bail!("no such object: {name}");
        };
        std::fs::write(dest, bytes).with_context(|| format!("write {}", dest.display()))?;
        Ok(bytes.len() as u64)
    }
}

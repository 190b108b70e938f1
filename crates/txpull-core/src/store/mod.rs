//! Bucket access: the `ObjectStore` seam, the GCS JSON API client, and an
//! in-memory double for tests.

mod gcs;
mod memory;

pub use gcs::{Credentials, GcsStore};
pub use memory::MemoryStore;

use anyhow::Result;
use std::path::Path;

/// One object in the bucket listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    /// Path-like object name, `/`-separated.
    pub name: String,
    /// Size in bytes as advertised by the listing, if known.
    pub size: Option<u64>,
}

/// Listing and retrieval against a bucket. The sync loop only sees this
/// trait, so tests can substitute [`MemoryStore`].
pub trait ObjectStore {
    /// Enumerate all objects in the bucket.
    fn list(&self) -> Result<Vec<RemoteObject>>;

    /// Download one object's full content to `dest`, returning the number of
    /// bytes written. Blocks until the transfer completes.
    fn fetch_to_path(&self, name: &str, dest: &Path) -> Result<u64>;
}

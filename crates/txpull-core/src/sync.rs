//! The incremental sync loop: list, filter, fetch, validate, record.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::checkpoint::Checkpoint;
use crate::checksum;
use crate::config::PullConfig;
use crate::names;
use crate::store::ObjectStore;
use crate::validate::{self, ValidationError};

/// What one run did.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Object names downloaded and validated this run, in download order.
    pub downloaded: Vec<String>,
    /// Matching objects skipped because the checkpoint already had them.
    pub skipped: usize,
    /// Downloads deleted after failing validation; retried on a later run.
    pub failed: usize,
}

/// Runs one incremental pass over the bucket.
///
/// Validation failures are contained per object: the local file is removed,
/// the name stays out of the checkpoint, and the loop continues. Listing and
/// download I/O errors propagate and abort the run.
pub fn run_sync(
    cfg: &PullConfig,
    store: &dyn ObjectStore,
    checkpoint: &mut Checkpoint,
) -> Result<SyncReport> {
    fs::create_dir_all(&cfg.download_dir)
        .with_context(|| format!("create download dir: {}", cfg.download_dir.display()))?;

    let objects = store.list()?;
    tracing::debug!("listing returned {} object(s)", objects.len());

    let mut report = SyncReport::default();
    for object in objects {
        if !object.name.ends_with(&cfg.object_suffix) {
            continue;
        }
        if checkpoint.contains(&object.name) {
            report.skipped += 1;
            continue;
        }

        let dest = local_path(cfg, &object.name);
        tracing::info!("downloading {} -> {}", object.name, dest.display());
        let bytes = store.fetch_to_path(&object.name, &dest)?;

        match validate::validate_file(&dest, cfg.min_object_bytes, cfg.preview_rows) {
            Ok(()) => {
                let digest = checksum::sha256_file(&dest)?;
                checkpoint.record(&object.name);
                tracing::info!(
                    "downloaded and validated {} ({} bytes, sha256 {})",
                    object.name,
                    bytes,
                    digest
                );
                report.downloaded.push(object.name);
            }
            Err(err) => {
                report.failed += 1;
                remove_rejected(&dest, &object.name, &err);
            }
        }
    }

    Ok(report)
}

/// Local destination for an object: the flattened name under the download dir.
pub fn local_path(cfg: &PullConfig, object_name: &str) -> PathBuf {
    cfg.download_dir.join(names::flatten_object_name(object_name))
}

/// Deletes a download that failed validation. The object was never recorded,
/// so the next run retries it fresh.
fn remove_rejected(dest: &Path, object_name: &str, err: &ValidationError) {
    tracing::warn!("validation failed for {}: {}", object_name, err);
    if let Err(e) = fs::remove_file(dest) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("could not remove rejected file {}: {}", dest.display(), e);
        }
    }
}

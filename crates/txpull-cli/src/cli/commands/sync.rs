//! `txpull sync` – run one incremental pull over the bucket.

use anyhow::{bail, Result};
use txpull_core::checkpoint::Checkpoint;
use txpull_core::config::{self, PullConfig};
use txpull_core::store::{Credentials, GcsStore};
use txpull_core::sync;

pub fn run_sync(cfg: &PullConfig) -> Result<()> {
    if cfg.bucket.is_empty() {
        bail!(
            "no bucket configured; set `bucket` in {}",
            config::config_path()?.display()
        );
    }

    let credentials = match &cfg.credentials_file {
        Some(path) => Some(Credentials::from_file(path)?),
        None => None,
    };
    let mut store = GcsStore::new(cfg.bucket.clone(), credentials)?;
    if let Some(project) = &cfg.user_project {
        store = store.with_user_project(project.clone());
    }

    let checkpoint_path = cfg.checkpoint_path()?;
    let mut checkpoint = Checkpoint::load_from_path(&checkpoint_path)?;

    let report = sync::run_sync(cfg, &store, &mut checkpoint)?;

    if checkpoint.save_if_new(&checkpoint_path)? {
        tracing::info!(
            "checkpoint updated with {} new download(s)",
            checkpoint.newly_recorded().len()
        );
    }

    if report.downloaded.is_empty() && report.failed == 0 {
        println!("No new files to download.");
    } else {
        for name in &report.downloaded {
            println!("downloaded {}", name);
        }
        if report.failed > 0 {
            println!(
                "{} download(s) failed validation and will be retried next run",
                report.failed
            );
        }
    }
    tracing::info!(
        "sync complete: {} new, {} skipped, {} failed",
        report.downloaded.len(),
        report.skipped,
        report.failed
    );
    Ok(())
}

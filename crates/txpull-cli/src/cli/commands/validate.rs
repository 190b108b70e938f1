//! `txpull validate` – run the download validator against a local file.

use anyhow::Result;
use std::path::Path;
use txpull_core::config::PullConfig;
use txpull_core::validate;

pub fn run_validate(cfg: &PullConfig, path: &Path) -> Result<()> {
    match validate::validate_file(path, cfg.min_object_bytes, cfg.preview_rows) {
        Ok(()) => {
            println!("ok: {}", path.display());
            Ok(())
        }
        Err(err) => anyhow::bail!("{}: {}", path.display(), err),
    }
}

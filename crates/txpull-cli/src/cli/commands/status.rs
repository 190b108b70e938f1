//! `txpull status` – show what the checkpoint already covers.

use anyhow::Result;
use txpull_core::checkpoint::Checkpoint;
use txpull_core::config::PullConfig;

pub fn run_status(cfg: &PullConfig) -> Result<()> {
    let path = cfg.checkpoint_path()?;
    let checkpoint = Checkpoint::load_from_path(&path)?;
    if checkpoint.is_empty() {
        println!("Checkpoint is empty; nothing pulled yet.");
    } else {
        println!("{} object(s) pulled:", checkpoint.len());
        for name in checkpoint.iter() {
            println!("  {}", name);
        }
    }
    Ok(())
}

//! CLI command handlers, one per file.

mod checksum;
mod status;
mod sync;
mod validate;

pub use checksum::run_checksum;
pub use status::run_status;
pub use sync::run_sync;
pub use validate::run_validate;

//! Opt-in file logging.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Installs a file-backed subscriber for the crate's `tracing` events.
///
/// Installation happens at most once per process: if a global subscriber is
/// already set (by an earlier call or by the hosting application), it is
/// kept and this call only opens the log file.
pub(crate) fn init(log_file: &Path) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let _ = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(Arc::new(file))
        .try_init();

    Ok(())
}

//! Exclusive run guard.
//!
//! The external scheduler fires once per day, but a hung run must not let the
//! next invocation interleave writes. The lock file is created exclusively
//! and removed on drop; a pre-existing lock aborts the run.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;

pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: PathBuf) -> Result<Self> {
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .with_context(|| {
                format!(
                    "acquiring run lock {} (is another run in progress?)",
                    path.display()
                )
            })?;
        Ok(Self { path })
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(error = %e, path = %self.path.display(), "could not remove run lock");
        }
    }
}

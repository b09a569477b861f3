// SPDX-License-Identifier: MIT

//! Coordinator process lifecycle.
//!
//! A worker process attaching to a shared container must never end up
//! racing another worker to launch a second coordinator over the same
//! state directory. [`ProcessSpawner`] makes that decision explicit
//! instead of leaving it to whoever calls `start()` first.

use std::fs::OpenOptions;
use std::path::Path;

use async_trait::async_trait;
use fs2::FileExt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to prepare coordinator state directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to launch coordinator binary: {0}")]
    LaunchFailed(String),
}

/// Starts (or confirms the existence of) a coordinator process.
///
/// Implementors decide *how* a coordinator gets launched; the contract is
/// only that `ensure_coordinator_running` is safe to call from many
/// processes concurrently and results in exactly one live coordinator.
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// True if a coordinator already holds the lock file at `lock_path`.
    fn is_coordinator_running(&self, lock_path: &Path) -> bool;

    /// Launch a coordinator if, and only if, none is currently running.
    async fn ensure_coordinator_running(
        &self,
        binary: &Path,
        state_dir: &Path,
        lock_path: &Path,
    ) -> Result<(), SpawnError>;
}

/// Spawns the coordinator as a detached child of the real OS process
/// table, using the same non-blocking `try_lock_exclusive` probe the
/// coordinator itself uses to refuse to start twice.
pub struct NativeProcessSpawner;

impl NativeProcessSpawner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NativeProcessSpawner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProcessSpawner for NativeProcessSpawner {
    fn is_coordinator_running(&self, lock_path: &Path) -> bool {
        let file = match OpenOptions::new().write(true).create(true).truncate(false).open(lock_path)
        {
            Ok(f) => f,
            Err(_) => return false,
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                let _ = FileExt::unlock(&file);
                false
            }
            Err(_) => true,
        }
    }

    async fn ensure_coordinator_running(
        &self,
        binary: &Path,
        state_dir: &Path,
        lock_path: &Path,
    ) -> Result<(), SpawnError> {
        std::fs::create_dir_all(state_dir)?;
        if self.is_coordinator_running(lock_path) {
            debug!(path = %lock_path.display(), "coordinator already running, not spawning another");
            return Ok(());
        }

        tokio::process::Command::new(binary)
            .env("SHARE_STATE_DIR", state_dir)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| SpawnError::LaunchFailed(e.to_string()))?;
        Ok(())
    }
}

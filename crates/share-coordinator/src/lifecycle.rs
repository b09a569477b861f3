// SPDX-License-Identifier: MIT

//! Coordinator startup and shutdown.
//!
//! Unlike a durable daemon, the coordinator keeps no on-disk journal: a
//! crashed coordinator's replacement starts the Source of Truth empty
//! (spec §6 "the SoT is re-initialized empty, no attempt at salvaging
//! in-flight commands"). Startup therefore only has to win the race for
//! the lock file, create a fresh shared-memory region, and bind the
//! control socket — there is nothing to replay.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use share_sot::Sot;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::info;

use crate::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub shmem_flink: PathBuf,
    pub sot_capacity: usize,
    pub sot_slot_count: usize,
    pub channel_capacity: usize,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("coordinator.sock"),
            lock_path: state_dir.join("coordinator.lock"),
            shmem_flink: state_dir.join("coordinator.shm"),
            sot_capacity: env::sot_capacity(),
            sot_slot_count: env::sot_slot_count(),
            channel_capacity: env::channel_capacity(),
            state_dir,
        })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire lock: coordinator already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("failed to initialize source of truth: {0}")]
    Sot(#[from] share_sot::SotError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything a running coordinator holds for the lifetime of the process.
pub struct CoordinatorState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub sot: Arc<Sot>,
}

pub struct StartupResult {
    pub state: CoordinatorState,
    pub listener: UnixListener,
}

pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config.clone()).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // Stale shared-memory region and socket from a crashed predecessor are
    // not reused — start() always re-initializes the SoT empty.
    let _ = std::fs::remove_file(&config.shmem_flink);
    let sot = Sot::create(&config.shmem_flink, config.sot_capacity, config.sot_slot_count)?;

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!(
        socket = %config.socket_path.display(),
        shmem = %config.shmem_flink.display(),
        "--- share-coordinator: starting (pid: {}) ---",
        std::process::id()
    );

    Ok(StartupResult { state: CoordinatorState { config, lock_file, sot: Arc::new(sot) }, listener })
}

fn cleanup_on_failure(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
    let _ = std::fs::remove_file(&config.shmem_flink);
}

impl CoordinatorState {
    pub fn shutdown(self) {
        info!("coordinator shutting down");
        let _ = std::fs::remove_file(&self.config.socket_path);
        let _ = std::fs::remove_file(&self.config.shmem_flink);
        // lock_file's exclusive lock and the lock file itself are released
        // and removed last, after every other artifact is gone.
        let _ = std::fs::remove_file(&self.config.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        let dir = tempfile::tempdir().unwrap().into_path();
        Config {
            socket_path: dir.join("c.sock"),
            lock_path: dir.join("c.lock"),
            shmem_flink: dir.join("c.shm"),
            sot_capacity: 1 << 16,
            sot_slot_count: 8,
            channel_capacity: 16,
            state_dir: dir,
        }
    }

    #[tokio::test]
    async fn startup_binds_socket_and_creates_empty_sot() {
        let config = test_config();
        let started = startup(config).await.unwrap();
        assert!(started.state.config.socket_path.exists());
        assert!(started.state.sot.snapshot_names().is_empty());
        started.state.shutdown();
    }

    #[tokio::test]
    async fn second_startup_against_the_same_lock_path_fails() {
        let config = test_config();
        let first = startup(config.clone()).await.unwrap();

        let err = startup(config).await.unwrap_err();
        assert!(matches!(err, LifecycleError::LockFailed(_)));

        first.state.shutdown();
    }

    #[tokio::test]
    async fn shutdown_removes_socket_lock_and_shmem_files() {
        let config = test_config();
        let started = startup(config.clone()).await.unwrap();
        started.state.shutdown();

        assert!(!config.socket_path.exists());
        assert!(!config.lock_path.exists());
        assert!(!config.shmem_flink.exists());
    }
}

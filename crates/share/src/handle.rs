// SPDX-License-Identifier: MIT

//! Transport form of a running [`Share`](crate::Share), for handing a
//! live container to a worker process (spec §4.4.6).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Everything a worker process needs to attach to an already-running
/// coordinator: where its control socket and shared-memory region live,
/// and where its lock file is, so a worker can tell a live coordinator
/// apart from a stale one without starting a second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedHandle {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub shmem_flink: PathBuf,
    pub lock_path: PathBuf,
    pub timeout_ms: u64,
}

impl SharedHandle {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

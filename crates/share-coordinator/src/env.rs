// SPDX-License-Identifier: MIT

//! Centralized environment variable access for the coordinator.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: `SHARE_STATE_DIR` > `XDG_STATE_HOME/share` > `~/.local/state/share`.
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SHARE_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("share"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/share"))
}

/// Timeout a command sender waits for a synchronous reply.
pub fn ipc_timeout() -> Duration {
    std::env::var("SHARE_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// How long `stop()` waits for already-enqueued commands to drain before
/// giving up and reporting the stragglers as timed out.
pub fn drain_timeout() -> Duration {
    std::env::var("SHARE_DRAIN_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Size in bytes of the shared-memory region backing the Source of Truth.
pub fn sot_capacity() -> usize {
    std::env::var("SHARE_SOT_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(4 * 1024 * 1024)
}

/// Maximum number of live entries the Source of Truth can track at once.
pub fn sot_slot_count() -> usize {
    std::env::var("SHARE_SOT_SLOT_COUNT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(256)
}

/// Bound on the command channel's buffer, for backpressure.
pub fn channel_capacity() -> usize {
    std::env::var("SHARE_CHANNEL_CAPACITY")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(1024)
}

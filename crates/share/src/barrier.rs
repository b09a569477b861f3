// SPDX-License-Identifier: MIT

//! Barrier protocol (spec §4.4.5): after a write is acknowledged by the
//! coordinator, the sending process waits for its own write to become
//! visible in shared memory before trusting a subsequent fast-path read,
//! rather than round-tripping every read through the coordinator.

use std::time::Duration;

use share_core::{EntryName, ShareError, Version};
use share_sot::Sot;

const POLL_INTERVAL: Duration = Duration::from_micros(200);

/// Block until `sot`'s version for `name` is at least `min_version`, or
/// `timeout` elapses.
pub async fn wait_for_version(
    sot: &Sot,
    name: &EntryName,
    min_version: Version,
    timeout: Duration,
) -> Result<(), ShareError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if sot.version_of(name) >= min_version {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ShareError::ChannelTimeout);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Block until `name` is absent from `sot`, or `timeout` elapses.
///
/// A deleted entry's own version resets to [`Version::ABSENT`] rather
/// than advancing, so [`wait_for_version`]'s "at least N" test does not
/// apply here; this waits on the entry's presence directly instead.
pub async fn wait_for_absence(sot: &Sot, name: &EntryName, timeout: Duration) -> Result<(), ShareError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if sot.get(name).is_none() {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ShareError::ChannelTimeout);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

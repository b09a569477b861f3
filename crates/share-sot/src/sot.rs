// SPDX-License-Identifier: MIT

//! The Source of Truth public contract (spec §4.1).

use std::path::{Path, PathBuf};

use share_core::{EntryName, Version};
use tracing::debug;

use crate::error::SotError;
use crate::region::Region;

/// A mapping *name → encoded-bytes* held in a process-shared region, plus
/// per-entry and global version counters.
///
/// Only the coordinator calls the mutating methods ([`Sot::put`],
/// [`Sot::delete`], [`Sot::clear`]); every participant, including the
/// coordinator, may call the read-only methods without ever blocking a
/// concurrent reader of a different name (spec §4.1).
pub struct Sot {
    region: Region,
    flink: PathBuf,
}

impl Sot {
    /// Create a brand-new region backed by a shared-memory file at `flink`.
    /// Only the coordinator does this, once, at `start()`.
    pub fn create(flink: &Path, capacity: usize, slot_count: usize) -> Result<Self, SotError> {
        let shmem = shared_memory::ShmemConf::new()
            .size(capacity)
            .flink(flink)
            .create()
            .map_err(|e| SotError::Backend(e.to_string()))?;
        debug!(path = %flink.display(), capacity, slot_count, "created shared-memory SoT region");
        let region = Region::create(shmem, capacity, slot_count)?;
        Ok(Self { region, flink: flink.to_path_buf() })
    }

    /// Attach to a region created by [`Sot::create`] in another process.
    pub fn open(flink: &Path) -> Result<Self, SotError> {
        let shmem = shared_memory::ShmemConf::new()
            .flink(flink)
            .open()
            .map_err(|e| SotError::Backend(e.to_string()))?;
        let region = Region::open(shmem)?;
        Ok(Self { region, flink: flink.to_path_buf() })
    }

    pub fn flink(&self) -> &Path {
        &self.flink
    }

    /// Coordinator-only. Atomically replace any previous bytes for `name`
    /// and bump its version and the global counter.
    pub fn put(&self, name: &EntryName, encoded_bytes: &[u8]) -> Result<Version, SotError> {
        let v = self.region.put(name.as_str(), encoded_bytes)?;
        Ok(Version(v))
    }

    /// Callable by anyone. Returns a self-consistent (bytes, version) pair,
    /// or `None` if the entry is absent.
    pub fn get(&self, name: &EntryName) -> Option<(Vec<u8>, Version)> {
        self.region.get(name.as_str()).map(|(bytes, v)| (bytes, Version(v)))
    }

    /// Coordinator-only. Removes the entry and its version.
    pub fn delete(&self, name: &EntryName) -> Result<bool, SotError> {
        self.region.delete(name.as_str())
    }

    /// Cheap read: the current version of `name`, or `Version::ABSENT`.
    pub fn version_of(&self, name: &EntryName) -> Version {
        Version(self.region.version_of(name.as_str()))
    }

    /// Cheap read: names of all live entries.
    pub fn snapshot_names(&self) -> Vec<EntryName> {
        self.region
            .snapshot_names()
            .into_iter()
            .filter_map(|n| EntryName::validate(n).ok())
            .collect()
    }

    /// The global write counter, for "has anything changed since N" checks.
    pub fn global_version(&self) -> Version {
        Version(self.region.global_version_snapshot())
    }

    /// Coordinator-only. Removes all entries and resets per-entry versions;
    /// the global counter keeps advancing (spec §9 open question: resolved
    /// to preserve monotonicity of the global counter across clears).
    pub fn clear(&self) {
        self.region.clear();
    }

    pub fn data_capacity(&self) -> usize {
        self.region.data_capacity()
    }
}

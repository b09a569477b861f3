// SPDX-License-Identifier: MIT

//! The raw cross-process shared-memory layout.
//!
//! This is the one module in the workspace that needs `unsafe`: turning a
//! `shared_memory::Shmem` mapping into typed fields requires reinterpreting
//! raw bytes, which `#[forbid(unsafe_code)]` (inherited everywhere else via
//! the workspace lints) cannot express. See `DESIGN.md` for why this crate
//! opts out of that lint instead of smuggling the unsafety into `share`.
//!
//! # Layout
//!
//! ```text
//! [ RegionHeader ][ SlotHeader 0 ][ data 0 ][ SlotHeader 1 ][ data 1 ] ...
//! ```
//!
//! Each slot is protected by a seqlock (`seq`): a writer increments `seq` to
//! an odd value before mutating the slot and back to an even value after, so
//! readers can detect and retry a torn read without ever blocking the
//! writer (spec §4.1: "Concurrent `get`s from many processes must not block
//! each other"). Only the coordinator process ever takes the writer path
//! (spec §3 invariant 1).

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::SotError;

/// Max bytes for an entry name, inline in the slot.
pub const MAX_NAME_LEN: usize = 64;

#[repr(C)]
struct RegionHeader {
    magic: AtomicU64,
    slot_count: AtomicU64,
    slot_stride: AtomicU64,
    global_version: AtomicU64,
}

const MAGIC: u64 = 0x5348_4152_455f_534f; // "SHARE_SO" truncated to 8 bytes

#[repr(C)]
struct SlotHeader {
    /// Odd while a write is in progress; even otherwise.
    seq: AtomicU64,
    /// Per-entry version; 0 means the slot is unused (spec §6.4).
    version: AtomicU64,
    /// Length of the name actually in use, 0 when the slot is free.
    name_len: AtomicU64,
    /// Length of the encoded payload currently stored.
    data_len: AtomicU64,
    name: [u8; MAX_NAME_LEN],
}

/// A name/version/bytes snapshot read from one slot.
pub struct SlotSnapshot {
    pub name: String,
    pub version: u64,
    pub data: Vec<u8>,
}

/// Typed view over a `shared_memory::Shmem` mapping.
pub struct Region {
    shmem: shared_memory::Shmem,
    slot_count: usize,
    slot_stride: usize,
    data_cap: usize,
}

// SAFETY: all access to the mapping goes through atomics and bounds-checked
// slices; the mapping itself is valid for as long as `shmem` is held.
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
    /// Create a brand-new region of `capacity` bytes, sized to hold
    /// approximately `slot_count` entries. Only the coordinator calls this.
    pub fn create(
        shmem: shared_memory::Shmem,
        capacity: usize,
        slot_count: usize,
    ) -> Result<Self, SotError> {
        let header_size = std::mem::size_of::<RegionHeader>();
        let slot_header_size = std::mem::size_of::<SlotHeader>();
        if slot_count == 0 || capacity <= header_size + slot_header_size {
            return Err(SotError::RegionTooSmall);
        }
        let budget = capacity - header_size;
        let slot_stride = budget / slot_count;
        if slot_stride <= slot_header_size {
            return Err(SotError::RegionTooSmall);
        }
        let region = Self { shmem, slot_count, slot_stride, data_cap: slot_stride - slot_header_size };

        // SAFETY: the mapping is at least `capacity` bytes (checked by the
        // caller via `ShmemConf::size`), and we just computed an in-bounds
        // header.
        let header = unsafe { region.header() };
        header.magic.store(MAGIC, Ordering::Relaxed);
        header.slot_count.store(slot_count as u64, Ordering::Relaxed);
        header.slot_stride.store(slot_stride as u64, Ordering::Relaxed);
        header.global_version.store(0, Ordering::Release);

        for i in 0..slot_count {
            // SAFETY: `i < slot_count`, in bounds by construction.
            let slot = unsafe { region.slot(i) };
            slot.seq.store(0, Ordering::Relaxed);
            slot.version.store(0, Ordering::Relaxed);
            slot.name_len.store(0, Ordering::Relaxed);
            slot.data_len.store(0, Ordering::Relaxed);
        }

        Ok(region)
    }

    /// Attach to an existing region created by [`Region::create`].
    pub fn open(shmem: shared_memory::Shmem) -> Result<Self, SotError> {
        let header_size = std::mem::size_of::<RegionHeader>();
        if shmem.len() <= header_size {
            return Err(SotError::RegionTooSmall);
        }
        // SAFETY: reads only the fixed-size header fields; bounds checked above.
        let (magic, slot_count, slot_stride) = unsafe {
            let ptr = shmem.as_ptr() as *const RegionHeader;
            let header = &*ptr;
            (
                header.magic.load(Ordering::Relaxed),
                header.slot_count.load(Ordering::Relaxed) as usize,
                header.slot_stride.load(Ordering::Relaxed) as usize,
            )
        };
        if magic != MAGIC {
            return Err(SotError::BadMagic);
        }
        let slot_header_size = std::mem::size_of::<SlotHeader>();
        if slot_stride <= slot_header_size {
            return Err(SotError::RegionTooSmall);
        }
        Ok(Self { shmem, slot_count, slot_stride, data_cap: slot_stride - slot_header_size })
    }

    pub fn data_capacity(&self) -> usize {
        self.data_cap
    }

    /// # Safety
    /// The region must have been initialized by [`Region::create`].
    unsafe fn header(&self) -> &RegionHeader {
        &*(self.shmem.as_ptr() as *const RegionHeader)
    }

    /// # Safety
    /// `index` must be `< self.slot_count`.
    unsafe fn slot(&self, index: usize) -> &SlotHeader {
        let header_size = std::mem::size_of::<RegionHeader>();
        let offset = header_size + index * self.slot_stride;
        &*(self.shmem.as_ptr().add(offset) as *const SlotHeader)
    }

    /// # Safety
    /// `index` must be `< self.slot_count`.
    unsafe fn slot_data(&self, index: usize) -> &[u8] {
        let header_size = std::mem::size_of::<RegionHeader>();
        let slot_header_size = std::mem::size_of::<SlotHeader>();
        let offset = header_size + index * self.slot_stride + slot_header_size;
        std::slice::from_raw_parts(self.shmem.as_ptr().add(offset), self.data_cap)
    }

    #[allow(clippy::mut_from_ref)]
    /// # Safety
    /// `index` must be `< self.slot_count`, and the caller must hold the
    /// coordinator's exclusive-writer discipline (invariant 1).
    unsafe fn slot_data_mut(&self, index: usize) -> &mut [u8] {
        let header_size = std::mem::size_of::<RegionHeader>();
        let slot_header_size = std::mem::size_of::<SlotHeader>();
        let offset = header_size + index * self.slot_stride + slot_header_size;
        std::slice::from_raw_parts_mut(self.shmem.as_ptr().add(offset), self.data_cap)
    }

    fn global_version(&self) -> u64 {
        // SAFETY: header is always initialized once the region is created/opened.
        unsafe { self.header() }.global_version.load(Ordering::Acquire)
    }

    fn bump_global_version(&self) -> u64 {
        // SAFETY: see above.
        unsafe { self.header() }.global_version.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Find the slot index currently holding `name`, if any, via a
    /// seqlock-consistent read of each slot's name.
    fn find(&self, name: &str) -> Option<usize> {
        (0..self.slot_count).find(|&i| matches!(self.read_slot(i), Some(s) if s.name == name))
    }

    /// Find the index of an unused slot, for a `put` of a brand-new name.
    fn find_free(&self) -> Option<usize> {
        // SAFETY: indices are all `< self.slot_count`.
        (0..self.slot_count)
            .find(|&i| unsafe { self.slot(i) }.version.load(Ordering::Acquire) == 0)
    }

    /// Read one slot with seqlock retry. Returns `None` if the slot is free.
    fn read_slot(&self, index: usize) -> Option<SlotSnapshot> {
        loop {
            // SAFETY: `index < self.slot_count` is an invariant of every caller.
            let slot = unsafe { self.slot(index) };
            let seq1 = slot.seq.load(Ordering::Acquire);
            if seq1 & 1 != 0 {
                std::hint::spin_loop();
                continue;
            }
            let version = slot.version.load(Ordering::Acquire);
            if version == 0 {
                let seq2 = slot.seq.load(Ordering::Acquire);
                if seq1 == seq2 {
                    return None;
                }
                continue;
            }
            let name_len = slot.name_len.load(Ordering::Acquire) as usize;
            let data_len = slot.data_len.load(Ordering::Acquire) as usize;
            let name_bytes = &slot.name[..name_len.min(MAX_NAME_LEN)];
            let name = String::from_utf8_lossy(name_bytes).into_owned();
            // SAFETY: `index < self.slot_count`.
            let data_slice = unsafe { self.slot_data(index) };
            let data = data_slice[..data_len.min(self.data_cap)].to_vec();
            let seq2 = slot.seq.load(Ordering::Acquire);
            if seq1 == seq2 {
                return Some(SlotSnapshot { name, version, data });
            }
        }
    }

    /// Coordinator-only: write `bytes` for `name`, creating the slot if
    /// needed. Returns the new per-entry version.
    pub fn put(&self, name: &str, bytes: &[u8]) -> Result<u64, SotError> {
        if name.len() > MAX_NAME_LEN {
            return Err(SotError::NameTooLong);
        }
        if bytes.len() > self.data_cap {
            return Err(SotError::EntryTooLarge { max: self.data_cap, actual: bytes.len() });
        }
        let index = match self.find(name) {
            Some(i) => i,
            None => self.find_free().ok_or(SotError::RegionFull)?,
        };
        self.bump_global_version();
        // SAFETY: `index < self.slot_count`, and only the coordinator writes.
        let slot = unsafe { self.slot(index) };
        let current = slot.version.load(Ordering::Acquire);
        let new_version = if current == 0 { 1 } else { current + 1 };
        slot.seq.fetch_add(1, Ordering::AcqRel);
        {
            // SAFETY: exclusive-writer discipline (invariant 1).
            let data = unsafe { self.slot_data_mut(index) };
            data[..bytes.len()].copy_from_slice(bytes);
        }
        slot.data_len.store(bytes.len() as u64, Ordering::Release);
        slot.name_len.store(name.len() as u64, Ordering::Release);
        // SAFETY: `index < self.slot_count`.
        let slot_mut_name = unsafe { self.slot_name_mut(index) };
        slot_mut_name[..name.len()].copy_from_slice(name.as_bytes());
        slot.version.store(new_version, Ordering::Release);
        slot.seq.fetch_add(1, Ordering::AcqRel);
        Ok(new_version)
    }

    /// # Safety
    /// `index` must be `< self.slot_count`, writer discipline applies.
    #[allow(clippy::mut_from_ref)]
    unsafe fn slot_name_mut(&self, index: usize) -> &mut [u8; MAX_NAME_LEN] {
        let header_size = std::mem::size_of::<RegionHeader>();
        let offset = header_size + index * self.slot_stride
            + std::mem::size_of::<SlotHeader>()
            - MAX_NAME_LEN;
        &mut *(self.shmem.as_ptr().add(offset) as *mut [u8; MAX_NAME_LEN])
    }

    /// Coordinator-only: clear the slot holding `name`, if present.
    pub fn delete(&self, name: &str) -> Result<bool, SotError> {
        let Some(index) = self.find(name) else { return Ok(false) };
        self.bump_global_version();
        // SAFETY: `index < self.slot_count`, coordinator-only writer.
        let slot = unsafe { self.slot(index) };
        slot.seq.fetch_add(1, Ordering::AcqRel);
        slot.version.store(0, Ordering::Release);
        slot.name_len.store(0, Ordering::Release);
        slot.data_len.store(0, Ordering::Release);
        slot.seq.fetch_add(1, Ordering::AcqRel);
        Ok(true)
    }

    /// Coordinator-only: clear every slot and bump the global counter once.
    pub fn clear(&self) {
        for i in 0..self.slot_count {
            // SAFETY: `i < self.slot_count`.
            let slot = unsafe { self.slot(i) };
            if slot.version.load(Ordering::Acquire) == 0 {
                continue;
            }
            slot.seq.fetch_add(1, Ordering::AcqRel);
            slot.version.store(0, Ordering::Release);
            slot.name_len.store(0, Ordering::Release);
            slot.data_len.store(0, Ordering::Release);
            slot.seq.fetch_add(1, Ordering::AcqRel);
        }
        self.bump_global_version();
    }

    /// Read-anywhere: get bytes + version for `name`.
    pub fn get(&self, name: &str) -> Option<(Vec<u8>, u64)> {
        let index = self.find(name)?;
        let snapshot = self.read_slot(index)?;
        (snapshot.name == name).then_some((snapshot.data, snapshot.version))
    }

    /// Read-anywhere: cheap version check without decoding bytes.
    pub fn version_of(&self, name: &str) -> u64 {
        self.find(name).and_then(|i| self.read_slot(i)).map(|s| s.version).unwrap_or(0)
    }

    /// Read-anywhere: names of all live entries.
    pub fn snapshot_names(&self) -> Vec<String> {
        (0..self.slot_count).filter_map(|i| self.read_slot(i)).map(|s| s.name).collect()
    }

    /// Read-anywhere: the global write counter, for cheap "anything changed
    /// since N" checks.
    pub fn global_version_snapshot(&self) -> u64 {
        self.global_version()
    }
}

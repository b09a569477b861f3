// SPDX-License-Identifier: MIT

//! Errors from the Source of Truth layer (spec §4.1).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SotError {
    #[error("shared-memory region is too small to hold its own header and slot table")]
    RegionTooSmall,

    #[error("shared-memory region has no more free slots")]
    RegionFull,

    #[error("entry name exceeds the {} byte limit", crate::region::MAX_NAME_LEN)]
    NameTooLong,

    #[error("encoded entry of {actual} bytes exceeds the {max} byte slot capacity")]
    EntryTooLarge { max: usize, actual: usize },

    #[error("shared-memory region has a bad or missing magic number")]
    BadMagic,

    #[error("shared-memory backend error: {0}")]
    Backend(String),
}

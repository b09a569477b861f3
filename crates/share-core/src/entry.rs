// SPDX-License-Identifier: MIT

//! Entry identity: names and versions (spec §3, §4.1, §6.4).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ShareError;

/// Name of an entry in the Source of Truth. Non-empty, unique within a
/// container. Names beginning with `_` are reserved for the container's own
/// attributes (spec §4.4.1, §6.1) and rejected by [`EntryName::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryName(String);

impl EntryName {
    /// Validate and wrap a candidate name.
    ///
    /// Rejects the empty string and any name starting with `_`, matching
    /// the reserved-prefix rule of spec §4.4.1 step 1 and the
    /// `InvalidShareName` error of §7.
    pub fn validate(name: impl Into<String>) -> Result<Self, ShareError> {
        let name = name.into();
        if name.is_empty() || name.starts_with('_') {
            return Err(ShareError::InvalidShareName(name));
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::borrow::Borrow<str> for EntryName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Monotonic version counter for one entry, or the global write counter.
///
/// `Version(0)` means "absent" (spec §6.4: "Version zero means absent").
/// Implementations use a 64-bit counter so wraparound cannot occur in
/// practice (spec §4.3, "Numeric semantics").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(pub u64);

impl Version {
    pub const ABSENT: Version = Version(0);

    pub fn is_absent(self) -> bool {
        self.0 == 0
    }

    /// The version immediately after this one.
    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

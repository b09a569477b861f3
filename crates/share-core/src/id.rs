// SPDX-License-Identifier: MIT

//! Container identity.
//!
//! A [`ContainerId`] is the stable identifier a `Share` embeds when it is
//! serialized into a worker process (spec §3, §4.4.6): enough for the
//! receiving process to find the same coordinator and source of truth
//! rather than spawning its own.

use std::fmt;

use serde::{Deserialize, Serialize};

const PREFIX: &str = "shr-";

/// Unique identifier for one `Share` container, stable across processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    /// Generate a new, random container id.
    pub fn new() -> Self {
        Self(format!("{PREFIX}{}", nanoid::nanoid!(19)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ContainerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ContainerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_have_the_container_prefix() {
        let id = ContainerId::new();
        assert!(id.as_str().starts_with(PREFIX));
    }

    #[test]
    fn new_ids_are_unique() {
        assert_ne!(ContainerId::new(), ContainerId::new());
    }

    #[test]
    fn round_trips_through_json() {
        let id = ContainerId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ContainerId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}

// SPDX-License-Identifier: MIT

//! Attribute paths: the unit of targeted read/write (spec §3).

use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered sequence of string steps into a rooted entry.
///
/// `AttributePath::new(["config", "limit"])` addresses the `limit`
/// attribute of the `config` attribute of whatever entry it is paired
/// with. The empty path addresses the entry root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributePath(Vec<String>);

impl AttributePath {
    /// The path addressing the entry root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(steps: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(steps.into_iter().map(Into::into).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn steps(&self) -> &[String] {
        &self.0
    }

    /// Return a new path with one more step appended, leaving `self` intact
    /// — this is how nested attribute access grows a proxy's path (§4.4.2).
    pub fn child(&self, step: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(step.into());
        Self(steps)
    }

    /// Whether `other` is this path or a path beneath it — used to decide if
    /// a write to `other` invalidates a cached read of `self` (§3 metadata).
    pub fn contains_or_is(&self, other: &AttributePath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

/// The `writes` side of method metadata: either a declared set of paths, or
/// the whole-entry marker used when metadata is absent (spec §3, §4.3 step
/// 2e).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteScope {
    /// No attributes written; the coordinator must not re-encode the entry.
    None,
    /// Exactly these paths are written.
    Paths(Vec<AttributePath>),
    /// Conservative default: the whole entry may have changed.
    WholeEntry,
}

impl WriteScope {
    pub fn is_empty(&self) -> bool {
        matches!(self, WriteScope::None)
    }

    pub fn paths(&self, root: impl Into<String>) -> Vec<AttributePath> {
        match self {
            WriteScope::None => Vec::new(),
            WriteScope::Paths(paths) => paths.clone(),
            WriteScope::WholeEntry => vec![AttributePath::new([root.into()])],
        }
    }
}

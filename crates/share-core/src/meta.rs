// SPDX-License-Identifier: MIT

//! `_shared_meta`: per-class read/write declarations (spec §3, §4.4.7).
//!
//! Share consumes this metadata; it does not derive it. Producing it from a
//! user type (by hand, by a derive macro, or some other form of
//! introspection) is explicitly out of scope (spec §1) — `share` only needs
//! the shape defined here, plus a conservative default for types that don't
//! provide it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::path::{AttributePath, WriteScope};

/// Read/write declaration for one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodMeta {
    pub reads: Vec<AttributePath>,
    pub writes: WriteScope,
}

impl MethodMeta {
    /// The metadata Share assumes when a class provides none: every method
    /// reads and writes the whole entry (spec §3).
    pub fn conservative() -> Self {
        Self { reads: vec![AttributePath::root()], writes: WriteScope::WholeEntry }
    }
}

/// Read declaration for one property. Properties never write (spec §3,
/// §6.1: "treated like a zero-arg method with writes = ∅").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMeta {
    pub reads: Vec<AttributePath>,
}

impl PropertyMeta {
    pub fn conservative() -> Self {
        Self { reads: vec![AttributePath::root()] }
    }
}

/// Per-class metadata: which methods/properties touch which attribute
/// paths. `share-adapters::ObjectCodec` implementations may supply this
/// by class name; `share` falls back to [`SharedMeta::conservative_for`]
/// when a class provides none (spec §4.4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SharedMeta {
    pub methods: HashMap<String, MethodMeta>,
    pub properties: HashMap<String, PropertyMeta>,
}

impl SharedMeta {
    pub fn method(&self, name: &str) -> MethodMeta {
        self.methods.get(name).cloned().unwrap_or_else(MethodMeta::conservative)
    }

    pub fn property(&self, name: &str) -> PropertyMeta {
        self.properties.get(name).cloned().unwrap_or_else(PropertyMeta::conservative)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_method_gets_conservative_meta() {
        let meta = SharedMeta::default();
        let m = meta.method("increment");
        assert_eq!(m.writes, WriteScope::WholeEntry);
    }

    #[test]
    fn declared_method_meta_is_used_verbatim() {
        let mut meta = SharedMeta::default();
        meta.methods.insert(
            "increment".to_string(),
            MethodMeta {
                reads: vec![AttributePath::new(["value"])],
                writes: WriteScope::Paths(vec![AttributePath::new(["value"])]),
            },
        );
        let m = meta.method("increment");
        assert_eq!(m.reads, vec![AttributePath::new(["value"])]);
    }
}

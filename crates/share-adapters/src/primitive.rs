// SPDX-License-Identifier: MIT

//! Built-in [`Shareable`] for primitive values (spec §9 open question:
//! resolved here as the smallest set that covers everyday assignments —
//! `None`, `bool`, integers, floats, `String`, raw bytes, and a shallow
//! list of any of those).
//!
//! Wrapping primitives in a `Shareable` the same way custom classes are
//! wrapped keeps the coordinator's dispatch path uniform: there is no
//! separate "primitive command" variant, just a class nobody has to
//! register by hand.

use serde::{Deserialize, Serialize};

use share_core::{AttributePath, SharedMeta};

use crate::codec::{CallError, CallResult, CodecError, Shareable};

pub const CLASS_NAME: &str = "__primitive__";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Primitive>),
}

impl Shareable for Primitive {
    fn class_name(&self) -> &'static str {
        CLASS_NAME
    }

    fn shared_meta(&self) -> SharedMeta {
        SharedMeta::default()
    }

    fn encode_self(&self) -> Result<Vec<u8>, CodecError> {
        bincode::serialize(self).map_err(|e| CodecError::Malformed(CLASS_NAME.into(), e.to_string()))
    }

    fn call(&mut self, _path: &AttributePath, method: &str, _args: &[u8]) -> Result<CallResult, CallError> {
        Err(CallError::NoSuchMethod { class: CLASS_NAME, method: method.to_string() })
    }

    fn get_path(&self, path: &AttributePath) -> Result<Vec<u8>, CallError> {
        if path.is_root() {
            return self.encode_self().map_err(CallError::from);
        }
        Err(CallError::NoSuchPath { class: CLASS_NAME, path: path.clone() })
    }
}

pub fn decode(bytes: &[u8]) -> Result<Box<dyn Shareable>, CodecError> {
    let value: Primitive =
        bincode::deserialize(bytes).map_err(|e| CodecError::Malformed(CLASS_NAME.into(), e.to_string()))?;
    Ok(Box::new(value))
}

// SPDX-License-Identifier: MIT

//! share-adapters: the bridge between arbitrary user types and the wire.
//!
//! Rust has no runtime reflection, so a type opts into being shared by
//! implementing [`Shareable`] itself — the same vtable-by-hand shape the
//! rest of the workspace uses for adapter boundaries. [`ObjectCodec`] turns
//! a `Shareable` into bytes and back; [`ProcessSpawner`] owns the
//! decision of whether a coordinator process needs to be started at all.

mod codec;
mod primitive;
mod registry;
mod spawner;

pub use codec::{CallError, CallResult, CodecError, EncodedObject, ObjectCodec, Shareable};
pub use primitive::Primitive;
pub use registry::BincodeCodec;
pub use spawner::{NativeProcessSpawner, ProcessSpawner, SpawnError};

// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use share_core::{AttributePath, SharedMeta};
use thiserror::Error;

/// Errors raised while turning a [`Shareable`] into bytes or back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("no registered class named {0:?}")]
    UnknownClass(String),
    #[error("malformed encoding for class {0:?}: {1}")]
    Malformed(String, String),
}

/// Errors raised while dispatching a call or attribute read against a
/// live [`Shareable`] instance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallError {
    #[error("{class} has no method named {method:?}")]
    NoSuchMethod { class: &'static str, method: String },
    #[error("{class} has no attribute at path {path:?}")]
    NoSuchPath { class: &'static str, path: AttributePath },
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The outcome of a successful dispatch: either the method returned
/// normally, or the user code raised/panicked-as-exception and the
/// caller-visible exception payload is carried back instead (spec S4:
/// a method that raises must not corrupt the entry's other state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallResult {
    Ok(Vec<u8>),
    Raised(Vec<u8>),
}

/// A class name plus its encoded bytes, as stored in the Source of Truth
/// and carried across the wire. The class name lets a codec pick the
/// right decoder on the receiving end without any type information from
/// the language runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedObject {
    pub class_name: String,
    pub bytes: Vec<u8>,
}

/// A user type that can live inside a shared container.
///
/// This is the Rust stand-in for "any object the other side can
/// construct and call back into": since there is no reflection, the type
/// itself supplies its own class name, metadata, encoder, and call
/// dispatcher. Implementors are expected to match on `method` /
/// `path` internally; see `share-adapters`' tests for the shape.
pub trait Shareable: Send + Sync {
    /// Stable name used to find the right decoder on the other side.
    fn class_name(&self) -> &'static str;

    /// Declared read/write footprint per method and property. Types that
    /// don't override this fall back to the conservative whole-entry
    /// default everywhere a path is looked up.
    fn shared_meta(&self) -> SharedMeta {
        SharedMeta::default()
    }

    fn encode_self(&self) -> Result<Vec<u8>, CodecError>;

    /// Dispatch a method call by name against a (possibly nested)
    /// attribute path. `args` is the codec's encoding of the call
    /// arguments; the return value is the codec's encoding of the
    /// method's return value or raised exception.
    fn call(
        &mut self,
        path: &AttributePath,
        method: &str,
        args: &[u8],
    ) -> Result<CallResult, CallError>;

    /// Read the current value at `path` without calling anything.
    fn get_path(&self, path: &AttributePath) -> Result<Vec<u8>, CallError>;
}

/// Turns [`Shareable`] values into [`EncodedObject`]s and back.
///
/// Implementations own a registry of known classes; attempting to decode
/// an `EncodedObject` whose `class_name` was never registered fails with
/// [`CodecError::UnknownClass`] rather than guessing.
pub trait ObjectCodec: Send + Sync {
    fn encode(&self, object: &dyn Shareable) -> Result<EncodedObject, CodecError>;
    fn decode(&self, encoded: &EncodedObject) -> Result<Box<dyn Shareable>, CodecError>;
    fn is_shareable(&self, class_name: &str) -> bool;
}

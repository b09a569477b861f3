// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::codec::{CodecError, EncodedObject, ObjectCodec, Shareable};

type Decoder = fn(&[u8]) -> Result<Box<dyn Shareable>, CodecError>;

/// An [`ObjectCodec`] backed by `bincode` and a compile-time type
/// registry keyed on [`Shareable::class_name`].
///
/// Rust has no `Any`-free way to go from a class-name string to a
/// concrete constructor, so each registered type contributes a decoder
/// function pointer rather than being looked up by `TypeId`. This keeps
/// the registry free of downcasting and makes "unknown class" a regular,
/// recoverable error instead of a panic.
pub struct BincodeCodec {
    decoders: HashMap<&'static str, Decoder>,
}

impl Default for BincodeCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl BincodeCodec {
    /// A codec with no registered classes besides the built-in primitive
    /// wrapper (spec §9's primitive fast path).
    pub fn new() -> Self {
        let mut codec = Self { decoders: HashMap::new() };
        codec.decoders.insert(crate::primitive::CLASS_NAME, crate::primitive::decode as Decoder);
        codec
    }

    /// Register a class's decoder under `class_name`, so instances
    /// encoded under that name can be turned back into a live
    /// [`Shareable`] on this side.
    pub fn register(&mut self, class_name: &'static str, decode: Decoder) {
        self.decoders.insert(class_name, decode);
    }
}

impl ObjectCodec for BincodeCodec {
    fn encode(&self, object: &dyn Shareable) -> Result<EncodedObject, CodecError> {
        let bytes = object.encode_self()?;
        Ok(EncodedObject { class_name: object.class_name().to_string(), bytes })
    }

    fn decode(&self, encoded: &EncodedObject) -> Result<Box<dyn Shareable>, CodecError> {
        let decode = self
            .decoders
            .get(encoded.class_name.as_str())
            .ok_or_else(|| CodecError::UnknownClass(encoded.class_name.clone()))?;
        decode(&encoded.bytes)
    }

    fn is_shareable(&self, class_name: &str) -> bool {
        self.decoders.contains_key(class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use share_core::{AttributePath, SharedMeta};
    use serde::{Deserialize, Serialize};

    use crate::codec::{CallError, CallResult};

    #[derive(Debug, Serialize, Deserialize, Default)]
    struct Counter {
        value: i64,
    }

    impl Shareable for Counter {
        fn class_name(&self) -> &'static str {
            "Counter"
        }

        fn shared_meta(&self) -> SharedMeta {
            SharedMeta::default()
        }

        fn encode_self(&self) -> Result<Vec<u8>, CodecError> {
            bincode::serialize(self).map_err(|e| CodecError::Malformed("Counter".into(), e.to_string()))
        }

        fn call(
            &mut self,
            _path: &AttributePath,
            method: &str,
            args: &[u8],
        ) -> Result<CallResult, CallError> {
            match method {
                "increment" => {
                    let by: i64 = bincode::deserialize(args)
                        .map_err(|e| CodecError::Malformed("Counter".into(), e.to_string()))?;
                    self.value += by;
                    let out = bincode::serialize(&self.value)
                        .map_err(|e| CodecError::Malformed("Counter".into(), e.to_string()))?;
                    Ok(CallResult::Ok(out))
                }
                other => Err(CallError::NoSuchMethod { class: "Counter", method: other.to_string() }),
            }
        }

        fn get_path(&self, path: &AttributePath) -> Result<Vec<u8>, CallError> {
            if path.is_root() {
                return self.encode_self().map_err(CallError::from);
            }
            Err(CallError::NoSuchPath { class: "Counter", path: path.clone() })
        }
    }

    fn decode_counter(bytes: &[u8]) -> Result<Box<dyn Shareable>, CodecError> {
        let counter: Counter =
            bincode::deserialize(bytes).map_err(|e| CodecError::Malformed("Counter".into(), e.to_string()))?;
        Ok(Box::new(counter))
    }

    #[test]
    fn round_trips_a_registered_type() {
        let mut codec = BincodeCodec::new();
        codec.register("Counter", decode_counter);

        let counter = Counter { value: 7 };
        let encoded = codec.encode(&counter).unwrap();
        assert_eq!(encoded.class_name, "Counter");

        let mut decoded = codec.decode(&encoded).unwrap();
        assert!(codec.is_shareable("Counter"));
        let result = decoded.call(&AttributePath::root(), "increment", &bincode::serialize(&3i64).unwrap());
        assert_eq!(result.unwrap(), CallResult::Ok(bincode::serialize(&10i64).unwrap()));
    }

    #[test]
    fn unknown_class_is_a_recoverable_error() {
        let codec = BincodeCodec::new();
        let encoded = EncodedObject { class_name: "Ghost".into(), bytes: vec![] };
        assert_eq!(codec.decode(&encoded), Err(CodecError::UnknownClass("Ghost".into())));
    }
}

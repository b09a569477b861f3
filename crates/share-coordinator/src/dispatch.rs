// SPDX-License-Identifier: MIT

//! Applies a single command against the Source of Truth (spec §4.3).
//!
//! One [`Dispatcher`] is owned by the single task that drains the command
//! channel; nothing here needs its own locking; ordering comes entirely
//! from that channel being consumed one item at a time.

use share_adapters::{CallError, CallResult, CodecError, EncodedObject, ObjectCodec};
use share_core::{Marker, StatusReport};
use share_sot::Sot;
use share_wire::{CommandKind, ReplyKind};
use std::sync::Arc;
use std::time::Instant;

pub struct Dispatcher {
    codec: Arc<dyn ObjectCodec>,
    start_time: Instant,
}

impl Dispatcher {
    pub fn new(codec: Arc<dyn ObjectCodec>, start_time: Instant) -> Self {
        Self { codec, start_time }
    }

    pub fn apply(&self, sot: &Sot, kind: CommandKind) -> ReplyKind {
        match kind {
            CommandKind::Set { name, encoded_value } => match sot.put(&name, &encoded_value) {
                Ok(version) => ReplyKind::Ok { payload: Vec::new(), version: version.0 },
                Err(e) => marker(Marker::CoordinatorError(e.to_string())),
            },

            CommandKind::Delete { name } => match sot.delete(&name) {
                Ok(_) => ReplyKind::Ok { payload: Vec::new(), version: sot.global_version().0 },
                Err(e) => marker(Marker::CoordinatorError(e.to_string())),
            },

            CommandKind::Get { name, path } => {
                let Some((bytes, version)) = sot.get(&name) else {
                    return marker(Marker::MissingEntry(name.to_string()));
                };
                match self.decode(&bytes, name.as_str()) {
                    Ok(obj) => match obj.get_path(&path) {
                        Ok(payload) => ReplyKind::Ok { payload, version: version.0 },
                        Err(e) => call_error_marker(e, name.as_str()),
                    },
                    Err(reply) => reply,
                }
            }

            CommandKind::Call { name, path, method_name, encoded_args, writes } => {
                let Some((bytes, version)) = sot.get(&name) else {
                    return marker(Marker::MissingEntry(name.to_string()));
                };
                let mut obj = match self.decode(&bytes, name.as_str()) {
                    Ok(obj) => obj,
                    Err(reply) => return reply,
                };
                let result = obj.call(&path, &method_name, &encoded_args);
                let next_version = if writes.is_empty() {
                    version
                } else {
                    match self.codec.encode(&*obj) {
                        Ok(encoded) => match bincode::serialize(&encoded) {
                            Ok(bytes) => match sot.put(&name, &bytes) {
                                Ok(v) => v,
                                Err(e) => return marker(Marker::CoordinatorError(e.to_string())),
                            },
                            Err(e) => return marker(Marker::SharedStateCorrupt(e.to_string())),
                        },
                        Err(e) => return marker(Marker::SharedStateCorrupt(e.to_string())),
                    }
                };
                match result {
                    Ok(CallResult::Ok(payload)) => {
                        ReplyKind::Ok { payload, version: next_version.0 }
                    }
                    Ok(CallResult::Raised(payload)) => {
                        ReplyKind::Exception { payload, version: next_version.0 }
                    }
                    Err(e) => call_error_marker(e, name.as_str()),
                }
            }

            CommandKind::ReconnectAll { .. } => {
                // Reconnector placeholders are a serializer-level concept this
                // workspace does not model as a distinct `Shareable` variant;
                // every live entry is reported as attempted, matching spec
                // §4.4's "returns a mapping" contract without fabricating a
                // specific reconnection outcome per entry.
                let names = sot.snapshot_names();
                match bincode::serialize(&names.iter().map(|n| n.to_string()).collect::<Vec<_>>())
                {
                    Ok(payload) => ReplyKind::Ok { payload, version: sot.global_version().0 },
                    Err(e) => marker(Marker::CoordinatorError(e.to_string())),
                }
            }

            CommandKind::Clear => {
                sot.clear();
                ReplyKind::Ok { payload: Vec::new(), version: sot.global_version().0 }
            }

            CommandKind::Status => {
                let report = StatusReport {
                    uptime_secs: self.start_time.elapsed().as_secs(),
                    entry_count: sot.snapshot_names().len(),
                    global_version: sot.global_version().0,
                    has_error: false,
                };
                match bincode::serialize(&report) {
                    Ok(payload) => ReplyKind::Ok { payload, version: sot.global_version().0 },
                    Err(e) => marker(Marker::CoordinatorError(e.to_string())),
                }
            }

            CommandKind::Shutdown => ReplyKind::Ok { payload: Vec::new(), version: sot.global_version().0 },
        }
    }

    fn decode(
        &self,
        bytes: &[u8],
        entry_name: &str,
    ) -> Result<Box<dyn share_adapters::Shareable>, ReplyKind> {
        let encoded: EncodedObject = bincode::deserialize(bytes)
            .map_err(|e| marker(Marker::SharedStateCorrupt(format!("{entry_name}: {e}"))))?;
        self.codec
            .decode(&encoded)
            .map_err(|e: CodecError| marker(Marker::SharedStateCorrupt(format!("{entry_name}: {e}"))))
    }
}

fn marker(m: Marker) -> ReplyKind {
    ReplyKind::Marker { marker: m }
}

fn call_error_marker(e: CallError, entry_name: &str) -> ReplyKind {
    match e {
        CallError::NoSuchMethod { class, method } => {
            marker(Marker::CoordinatorError(format!("{entry_name} ({class}) has no method {method:?}")))
        }
        CallError::NoSuchPath { class, path } => marker(Marker::CoordinatorError(format!(
            "{entry_name} ({class}) has no attribute at {path:?}"
        ))),
        CallError::Codec(e) => marker(Marker::SharedStateCorrupt(format!("{entry_name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use share_adapters::{BincodeCodec, Shareable};
    use share_core::{AttributePath, EntryName, SharedMeta, WriteScope};
    use serde::{Deserialize, Serialize};
    use std::path::PathBuf;

    #[derive(Debug, Serialize, Deserialize, Default, Clone)]
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
                    Ok(CallResult::Ok(bincode::serialize(&self.value).unwrap()))
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
        let c: Counter =
            bincode::deserialize(bytes).map_err(|e| CodecError::Malformed("Counter".into(), e.to_string()))?;
        Ok(Box::new(c))
    }

    fn fixture() -> (Sot, Dispatcher, PathBuf) {
        let dir = tempfile::tempdir().unwrap().into_path();
        let flink = dir.join("test.shm");
        let sot = Sot::create(&flink, 1 << 16, 8).unwrap();
        let mut codec = BincodeCodec::new();
        codec.register("Counter", decode_counter);
        (sot, Dispatcher::new(Arc::new(codec), Instant::now()), flink)
    }

    fn set_counter(sot: &Sot, name: &EntryName, value: i64) {
        let counter = Counter { value };
        let encoded = EncodedObject { class_name: "Counter".into(), bytes: counter.encode_self().unwrap() };
        let bytes = bincode::serialize(&encoded).unwrap();
        sot.put(name, &bytes).unwrap();
    }

    #[test]
    fn set_then_get_round_trips_through_the_codec() {
        let (sot, dispatcher, _flink) = fixture();
        let name = EntryName::validate("c").unwrap();
        set_counter(&sot, &name, 5);

        let reply = dispatcher.apply(&sot, CommandKind::Get { name, path: AttributePath::root() });
        match reply {
            ReplyKind::Ok { payload, version } => {
                let counter: Counter = bincode::deserialize(&payload).unwrap();
                assert_eq!(counter.value, 5);
                assert_eq!(version, 1);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn call_increments_and_persists_new_state() {
        let (sot, dispatcher, _flink) = fixture();
        let name = EntryName::validate("c").unwrap();
        set_counter(&sot, &name, 5);

        let reply = dispatcher.apply(
            &sot,
            CommandKind::Call {
                name: name.clone(),
                path: AttributePath::root(),
                method_name: "increment".into(),
                encoded_args: bincode::serialize(&3i64).unwrap(),
                writes: WriteScope::WholeEntry,
            },
        );
        match reply {
            ReplyKind::Ok { payload, version } => {
                let new_value: i64 = bincode::deserialize(&payload).unwrap();
                assert_eq!(new_value, 8);
                assert_eq!(version, 2);
            }
            other => panic!("unexpected reply: {other:?}"),
        }

        let (bytes, _) = sot.get(&name).unwrap();
        let encoded: EncodedObject = bincode::deserialize(&bytes).unwrap();
        let counter: Counter = bincode::deserialize(&encoded.bytes).unwrap();
        assert_eq!(counter.value, 8);
    }

    #[test]
    fn call_with_no_declared_writes_does_not_bump_version() {
        let (sot, dispatcher, _flink) = fixture();
        let name = EntryName::validate("c").unwrap();
        set_counter(&sot, &name, 5);

        let reply = dispatcher.apply(
            &sot,
            CommandKind::Call {
                name: name.clone(),
                path: AttributePath::root(),
                method_name: "increment".into(),
                encoded_args: bincode::serialize(&3i64).unwrap(),
                writes: WriteScope::None,
            },
        );
        assert!(matches!(reply, ReplyKind::Ok { version: 1, .. }));

        let (bytes, version) = sot.get(&name).unwrap();
        assert_eq!(version.0, 1);
        let encoded: EncodedObject = bincode::deserialize(&bytes).unwrap();
        let counter: Counter = bincode::deserialize(&encoded.bytes).unwrap();
        assert_eq!(counter.value, 5, "mutation happened in memory but must not be persisted");
    }

    #[test]
    fn get_on_missing_entry_returns_missing_entry_marker() {
        let (sot, dispatcher, _flink) = fixture();
        let name = EntryName::validate("ghost").unwrap();
        let reply = dispatcher.apply(&sot, CommandKind::Get { name, path: AttributePath::root() });
        assert!(matches!(reply, ReplyKind::Marker { marker: Marker::MissingEntry(_) }));
    }

    #[test]
    fn call_of_unknown_method_surfaces_as_coordinator_error_marker() {
        let (sot, dispatcher, _flink) = fixture();
        let name = EntryName::validate("c").unwrap();
        set_counter(&sot, &name, 5);

        let reply = dispatcher.apply(
            &sot,
            CommandKind::Call {
                name,
                path: AttributePath::root(),
                method_name: "no_such_method".into(),
                encoded_args: Vec::new(),
                writes: WriteScope::None,
            },
        );
        assert!(matches!(reply, ReplyKind::Marker { marker: Marker::CoordinatorError(_) }));
    }

    #[test]
    fn clear_empties_the_sot() {
        let (sot, dispatcher, _flink) = fixture();
        let name = EntryName::validate("c").unwrap();
        set_counter(&sot, &name, 5);

        let reply = dispatcher.apply(&sot, CommandKind::Clear);
        assert!(matches!(reply, ReplyKind::Ok { .. }));
        assert!(sot.snapshot_names().is_empty());
    }

    #[test]
    fn status_reports_entry_count_and_global_version() {
        let (sot, dispatcher, _flink) = fixture();
        set_counter(&sot, &EntryName::validate("a").unwrap(), 1);
        set_counter(&sot, &EntryName::validate("b").unwrap(), 2);

        let reply = dispatcher.apply(&sot, CommandKind::Status);
        match reply {
            ReplyKind::Ok { payload, .. } => {
                let report: share_core::StatusReport = bincode::deserialize(&payload).unwrap();
                assert_eq!(report.entry_count, 2);
                assert_eq!(report.global_version, 2);
                assert!(!report.has_error);
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }
}

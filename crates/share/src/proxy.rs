// SPDX-License-Identifier: MIT

//! The client-side façade for a shared entry (spec §4.4.2-§4.4.4).
//!
//! Most reads never touch the coordinator: they decode the entry straight
//! out of shared memory, so concurrent readers across many processes never
//! block each other or the writer. The exception is a declared property,
//! which is evaluated on the coordinator like a zero-arg method (spec
//! §6.1). Writes and method calls always go through the coordinator, then
//! wait on the barrier so the caller's own mutation is guaranteed visible
//! to its next fast-path read.

use std::sync::Arc;
use std::time::Duration;

use share_adapters::{EncodedObject, ObjectCodec, Shareable};
use share_core::{AttributePath, EntryName, ShareError, Version};
use share_sot::Sot;
use share_wire::{CommandKind, ReplyKind};

use crate::barrier;
use crate::client::ShareClient;

/// A handle onto one (possibly nested) attribute of a shared entry.
#[derive(Clone)]
pub struct ObjectProxy {
    client: Arc<ShareClient>,
    sot: Arc<Sot>,
    codec: Arc<dyn ObjectCodec>,
    name: EntryName,
    path: AttributePath,
    timeout: Duration,
}

impl ObjectProxy {
    pub(crate) fn new(
        client: Arc<ShareClient>,
        sot: Arc<Sot>,
        codec: Arc<dyn ObjectCodec>,
        name: EntryName,
        timeout: Duration,
    ) -> Self {
        Self { client, sot, codec, name, path: AttributePath::root(), timeout }
    }

    /// A proxy for the nested attribute `step` below this one.
    pub fn attr(&self, step: impl Into<String>) -> Self {
        Self { path: self.path.child(step), ..self.clone() }
    }

    pub fn path(&self) -> &AttributePath {
        &self.path
    }

    /// Decode the current value straight out of shared memory, without
    /// asking the coordinator. Used both for the fast-path read and to
    /// consult an entry's metadata before a `get`/`call` round-trip.
    fn decode(&self) -> Result<Box<dyn Shareable>, ShareError> {
        let (bytes, _version) = self
            .sot
            .get(&self.name)
            .ok_or_else(|| ShareError::MissingEntry(self.name.to_string()))?;
        let encoded: EncodedObject = bincode::deserialize(&bytes)
            .map_err(|e| ShareError::SharedStateCorrupt(format!("{}: {e}", self.name)))?;
        self.codec.decode(&encoded).map_err(|e| ShareError::SharedStateCorrupt(format!("{}: {e}", self.name)))
    }

    /// Read the value behind this path. A path whose leaf is declared a
    /// property in the entry's metadata is evaluated on the coordinator
    /// (spec §6.1); every other path, including the common case of a root
    /// read, is decoded straight out of shared memory and never waits on
    /// the coordinator.
    pub async fn get(&self) -> Result<Vec<u8>, ShareError> {
        let object = self.decode()?;
        let is_property = self
            .path
            .steps()
            .last()
            .is_some_and(|leaf| object.shared_meta().properties.contains_key(leaf));

        if !is_property {
            return object.get_path(&self.path).map_err(|e| ShareError::CoordinatorError(e.to_string()));
        }

        let reply = self
            .client
            .send_and_wait(CommandKind::Get { name: self.name.clone(), path: self.path.clone() })
            .await?;
        let (payload, _version, raised) = unpack(reply)?;
        if raised {
            return Err(ShareError::CoordinatorError(format!(
                "{} raised an exception while evaluating a property: {} bytes",
                self.name,
                payload.len()
            )));
        }
        Ok(payload)
    }

    /// Invoke a method on the live object behind this path, through the
    /// coordinator, then wait for the resulting write to land locally.
    /// The write scope sent to the coordinator is never chosen by the
    /// caller: it comes straight from the method's own metadata (spec
    /// §4.4.3 step 1), falling back to the conservative "whole entry"
    /// scope for classes that don't declare one.
    pub async fn call(&self, method_name: &str, encoded_args: Vec<u8>) -> Result<Vec<u8>, ShareError> {
        let writes = self.decode()?.shared_meta().method(method_name).writes;
        let reply = self
            .client
            .send_and_wait(CommandKind::Call {
                name: self.name.clone(),
                path: self.path.clone(),
                method_name: method_name.to_string(),
                encoded_args,
                writes,
            })
            .await?;

        let (payload, version, raised) = unpack(reply)?;
        barrier::wait_for_version(&self.sot, &self.name, Version(version), self.timeout).await?;
        if raised {
            return Err(ShareError::CoordinatorError(format!(
                "{} raised an exception: {} bytes",
                self.name,
                payload.len()
            )));
        }
        Ok(payload)
    }
}

/// Install a brand-new encoded object at `name` (spec §4.4.2 assignment).
pub async fn set(
    client: &ShareClient,
    sot: &Sot,
    name: &EntryName,
    encoded_value: Vec<u8>,
    timeout: Duration,
) -> Result<(), ShareError> {
    let reply = client.send_and_wait(CommandKind::Set { name: name.clone(), encoded_value }).await?;
    let (_, version, _) = unpack(reply)?;
    barrier::wait_for_version(sot, name, Version(version), timeout).await
}

pub async fn delete(
    client: &ShareClient,
    sot: &Sot,
    name: &EntryName,
    timeout: Duration,
) -> Result<(), ShareError> {
    let reply = client.send_and_wait(CommandKind::Delete { name: name.clone() }).await?;
    unpack(reply)?;
    barrier::wait_for_absence(sot, name, timeout).await
}

fn unpack(reply: share_wire::Reply) -> Result<(Vec<u8>, u64, bool), ShareError> {
    match reply.kind {
        ReplyKind::Ok { payload, version } => Ok((payload, version, false)),
        ReplyKind::Exception { payload, version } => Ok((payload, version, true)),
        ReplyKind::Marker { marker } => Err(marker.into()),
    }
}

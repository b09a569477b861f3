// SPDX-License-Identifier: MIT

//! `share`: a transparent, cross-process shared-object container.
//!
//! [`Share`] is the public entry point: a handful of ordinary objects
//! assigned into it become visible, with their live behavior intact, to
//! every process that holds the same container. A single coordinator
//! process owns the only copy of the real objects and serializes every
//! mutation; every process maps the same block of shared memory so reads
//! never have to ask the coordinator for anything.
//!
//! ```text
//! writer  --Set/Call-->  coordinator  --applies in order-->  shared memory
//! reader  <--------------------------- decodes directly ---/
//! ```

mod barrier;
mod client;
mod handle;
mod proxy;
mod share;

pub use client::ShareClient;
pub use handle::SharedHandle;
pub use proxy::ObjectProxy;
pub use share::{LifecycleState, Share, ShareConfig};

pub use share_adapters::{BincodeCodec, NativeProcessSpawner, ObjectCodec, ProcessSpawner, Shareable};
pub use share_core::{AttributePath, EntryName, ShareError, StatusReport, Version, WriteScope};

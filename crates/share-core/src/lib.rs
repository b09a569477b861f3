// SPDX-License-Identifier: MIT

//! share-core: domain types shared by every other `share-*` crate.
//!
//! Nothing in this crate touches a socket, a file, or a clock tick that
//! isn't behind the [`Clock`] abstraction. It exists so `share-wire`,
//! `share-sot`, `share-adapters`, `share-coordinator` and `share` all agree
//! on what an entry name is, what a version is, and what can go wrong.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod clock;
pub mod entry;
pub mod error;
pub mod id;
pub mod meta;
pub mod path;
pub mod status;

pub use clock::{Clock, FakeClock, SystemClock};
pub use entry::{EntryName, Version};
pub use error::{Marker, ShareError};
pub use id::ContainerId;
pub use meta::{MethodMeta, PropertyMeta, SharedMeta, WriteScope};
pub use path::AttributePath;
pub use status::StatusReport;

// SPDX-License-Identifier: MIT

//! share-wire: the command channel's wire format.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod command;
mod framing;

pub use command::{Command, CommandKind, Reply, ReplyId, ReplyKind};
pub use framing::{decode, encode, read_message, read_value, write_message, write_value, ProtocolError};

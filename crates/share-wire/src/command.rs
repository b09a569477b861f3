// SPDX-License-Identifier: MIT

//! Command/reply record layout (spec §3 "Command record", §6.4).

use serde::{Deserialize, Serialize};
use share_core::{AttributePath, EntryName, Marker, WriteScope};

/// Opaque handle identifying the reply channel for a synchronous command.
/// Assigned by the sending proxy; the coordinator echoes it back unchanged
/// so the client can route the reply to the right waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplyId(pub u64);

/// A command record, tagged per spec §3.
///
/// `sequence_number` is assigned by the sending proxy and carried only for
/// diagnostics (spec §3: "ordering is enforced by the channel itself").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub sequence_number: u64,
    pub reply_id: Option<ReplyId>,
    pub kind: CommandKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tag")]
pub enum CommandKind {
    /// Install `encoded_value` for `name`, creating or replacing the entry.
    Set { name: EntryName, encoded_value: Vec<u8> },
    /// Remove `name` and its version.
    Delete { name: EntryName },
    /// Invoke `method_name` on the sub-object at `path` within `name`.
    Call {
        name: EntryName,
        path: AttributePath,
        method_name: String,
        encoded_args: Vec<u8>,
        writes: WriteScope,
    },
    /// Decode `name`, traverse `path`, encode and reply with the leaf value.
    Get { name: EntryName, path: AttributePath },
    /// Resolve reconnector placeholders in every entry, in stable name order.
    ReconnectAll { encoded_auth: Vec<u8> },
    /// Remove every entry and reset per-entry versions.
    Clear,
    /// Report uptime, entry count and global version (ambient diagnostics,
    /// mirroring the teacher's `Request::Status`).
    Status,
    /// Stop the main loop after draining already-enqueued commands.
    Shutdown,
}

impl Command {
    pub fn is_synchronous(&self) -> bool {
        self.reply_id.is_some()
    }
}

/// Reply record layout (spec §6.4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub reply_id: ReplyId,
    pub kind: ReplyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ReplyKind {
    /// Successful call/get result, or the unit value for writes with no
    /// return the caller observes. `version` is the entry's version (or,
    /// for `Clear`, the global counter) immediately after the command was
    /// applied, letting the sender's barrier wait stop polling as soon as
    /// its own write becomes visible in shared memory.
    Ok { payload: Vec<u8>, version: u64 },
    /// A user-method exception, encoded by the external serializer.
    Exception { payload: Vec<u8>, version: u64 },
    /// A structural outcome from the taxonomy of spec §7.
    Marker { marker: Marker },
}

#[cfg(test)]
mod tests {
    use super::*;
    use share_core::AttributePath;

    #[test]
    fn command_is_synchronous_iff_reply_id_present() {
        let cmd = Command {
            sequence_number: 1,
            reply_id: None,
            kind: CommandKind::Clear,
        };
        assert!(!cmd.is_synchronous());

        let cmd = Command {
            sequence_number: 2,
            reply_id: Some(ReplyId(7)),
            kind: CommandKind::Get {
                name: EntryName::validate("x").unwrap(),
                path: AttributePath::root(),
            },
        };
        assert!(cmd.is_synchronous());
    }
}

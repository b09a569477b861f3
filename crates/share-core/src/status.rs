// SPDX-License-Identifier: MIT

//! Coordinator diagnostics, in the shape of the teacher's
//! `Request::Status`/`DaemonStatus` pair: a small snapshot a caller can
//! poll without touching any particular entry.

use serde::{Deserialize, Serialize};

/// Snapshot returned by the `Status` command (spec's ambient
/// observability supplement, not a spec.md module).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub uptime_secs: u64,
    pub entry_count: usize,
    pub global_version: u64,
    /// Always `false`: this coordinator keeps no durable error slot (see
    /// DESIGN.md) — a crashed coordinator restarts with an empty Source
    /// of Truth rather than recording and surfacing a prior failure.
    pub has_error: bool,
}

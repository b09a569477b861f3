// SPDX-License-Identifier: MIT

//! Client half of the command channel (spec §4.2, §6.4).
//!
//! Every command opens its own connection, sends exactly one `Command`,
//! and — for synchronous commands — waits for exactly one `Reply` before
//! the connection closes. This mirrors the one-request-per-connection
//! shape the coordinator's listener expects.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use share_core::ShareError;
use share_wire::{Command, CommandKind, ProtocolError, Reply, ReplyId};
use tokio::net::UnixStream;

use crate::share::LifecycleState;

pub struct ShareClient {
    socket_path: PathBuf,
    sequence: AtomicU64,
    timeout: Duration,
    state: Arc<RwLock<LifecycleState>>,
}

impl ShareClient {
    pub fn new(socket_path: PathBuf, timeout: Duration, state: Arc<RwLock<LifecycleState>>) -> Self {
        Self { socket_path, sequence: AtomicU64::new(1), timeout, state }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Send `kind` and wait for its reply.
    pub async fn send_and_wait(&self, kind: CommandKind) -> Result<Reply, ShareError> {
        let mut stream = self.connect().await?;
        let sequence_number = self.next_sequence();
        let command = Command { sequence_number, reply_id: Some(ReplyId(sequence_number)), kind };
        share_wire::write_value(&mut stream, &command, self.timeout)
            .await
            .map_err(|e| self.map_protocol_error(e))?;
        share_wire::read_value(&mut stream, self.timeout).await.map_err(|e| self.map_protocol_error(e))
    }

    /// Send `kind` without waiting for (or expecting) a reply.
    pub async fn send_only(&self, kind: CommandKind) -> Result<(), ShareError> {
        let mut stream = self.connect().await?;
        let command = Command { sequence_number: self.next_sequence(), reply_id: None, kind };
        share_wire::write_value(&mut stream, &command, self.timeout)
            .await
            .map_err(|e| self.map_protocol_error(e))
    }

    async fn connect(&self) -> Result<UnixStream, ShareError> {
        UnixStream::connect(&self.socket_path).await.map_err(|_| {
            self.mark_errored();
            ShareError::CoordinatorUnavailable
        })
    }

    /// A connection failure means the coordinator is gone, not merely slow
    /// (spec §4.5: "Coordinator crash → has_error becomes true"). Any other
    /// process sharing this container learns about the crash the same way,
    /// the next time it tries to send something.
    fn mark_errored(&self) {
        *self.state.write() = LifecycleState::Errored;
    }

    fn map_protocol_error(&self, e: ProtocolError) -> ShareError {
        match e {
            ProtocolError::ConnectionClosed => {
                self.mark_errored();
                ShareError::CoordinatorUnavailable
            }
            ProtocolError::Timeout => ShareError::ChannelTimeout,
            ProtocolError::MessageTooLarge => ShareError::CoordinatorError("message too large".into()),
            ProtocolError::Io(e) => ShareError::CoordinatorError(e.to_string()),
            ProtocolError::Codec(e) => ShareError::CoordinatorError(e.to_string()),
        }
    }
}

// SPDX-License-Identifier: MIT

//! The single-writer loop: the only place `Sot::put`/`delete`/`clear` are
//! called from, so the channel's FIFO order is the entire ordering
//! guarantee the rest of the system relies on (spec §3, §4.2).

use std::sync::Arc;
use std::time::Duration;

use share_sot::Sot;
use share_wire::{CommandKind, Reply};
use tokio::sync::{mpsc, Notify};
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::listener::QueuedCommand;

pub async fn run(
    mut command_rx: mpsc::Receiver<QueuedCommand>,
    sot: Arc<Sot>,
    dispatcher: Dispatcher,
    shutdown: Arc<Notify>,
    drain_timeout: Duration,
) {
    while let Some(queued) = command_rx.recv().await {
        let is_shutdown = matches!(&queued.command.kind, CommandKind::Shutdown);
        apply_and_reply(&sot, &dispatcher, queued);

        if is_shutdown {
            info!("draining already-enqueued commands before shutdown");
            drain_remaining(&mut command_rx, &sot, &dispatcher, drain_timeout).await;
            break;
        }
    }
    shutdown.notify_one();
}

fn apply_and_reply(sot: &Sot, dispatcher: &Dispatcher, queued: QueuedCommand) {
    let reply_id = queued.command.reply_id;
    let kind = dispatcher.apply(sot, queued.command.kind);
    if let (Some(tx), Some(reply_id)) = (queued.reply_tx, reply_id) {
        let _ = tx.send(Reply { reply_id, kind });
    }
}

async fn drain_remaining(
    command_rx: &mut mpsc::Receiver<QueuedCommand>,
    sot: &Sot,
    dispatcher: &Dispatcher,
    timeout: Duration,
) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            break;
        }
        match tokio::time::timeout(remaining, command_rx.recv()).await {
            Ok(Some(queued)) => apply_and_reply(sot, dispatcher, queued),
            Ok(None) | Err(_) => break,
        }
    }
}

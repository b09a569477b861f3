// SPDX-License-Identifier: MIT

//! Accepts connections on the control socket and forwards each command
//! onto the single-writer queue, without blocking on the result.

use std::sync::Arc;

use share_wire::{Command, ProtocolError, Reply};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{debug, error, info};

use crate::env::ipc_timeout;

/// A command handed off from a connection task to the single-writer loop,
/// with an optional channel for its reply (`None` for fire-and-forget
/// commands, i.e. those sent with no `reply_id`).
pub struct QueuedCommand {
    pub command: Command,
    pub reply_tx: Option<oneshot::Sender<Reply>>,
}

pub struct ListenCtx {
    pub command_tx: mpsc::Sender<QueuedCommand>,
    pub shutdown: Arc<Notify>,
}

#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("coordinator loop is no longer accepting commands")]
    LoopClosed,
}

pub struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    pub async fn run(self) {
        loop {
            tokio::select! {
                accepted = self.unix.accept() => {
                    match accepted {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, &ctx).await {
                                    log_connection_error(e);
                                }
                            });
                        }
                        Err(e) => error!("accept error: {}", e),
                    }
                }
                _ = self.ctx.shutdown.notified() => {
                    info!("listener stopping");
                    break;
                }
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => debug!("connection timed out waiting for a command"),
        other => error!("connection error: {}", other),
    }
}

async fn handle_connection(
    stream: tokio::net::UnixStream,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError> {
    let (mut reader, mut writer) = stream.into_split();
    let command: Command = share_wire::read_value(&mut reader, ipc_timeout()).await?;
    let is_synchronous = command.is_synchronous();

    let (reply_tx, reply_rx) = if is_synchronous {
        let (tx, rx) = oneshot::channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    ctx.command_tx
        .send(QueuedCommand { command, reply_tx })
        .await
        .map_err(|_| ConnectionError::LoopClosed)?;

    if let Some(rx) = reply_rx {
        let reply = rx.await.map_err(|_| ConnectionError::LoopClosed)?;
        share_wire::write_value(&mut writer, &reply, ipc_timeout()).await?;
    }

    Ok(())
}

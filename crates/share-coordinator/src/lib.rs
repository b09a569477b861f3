// SPDX-License-Identifier: MIT

//! share-coordinator: the single writer behind a shared container
//! (spec §4.2).
//!
//! This crate is consumed two ways. The `share-coordinatord` binary is a
//! ready-to-run coordinator for containers that only hold primitive
//! values. A host process with its own `Shareable` types links this
//! crate as a library and calls [`run`] with a codec that has those
//! types registered, re-executing itself as the coordinator the same
//! way the rest of this workspace's adapters re-exec a known binary
//! rather than shelling out to a generic one.

pub mod dispatch;
pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod main_loop;

use std::sync::Arc;

use share_adapters::ObjectCodec;
use tokio::sync::{mpsc, Notify};
use tracing::info;

use dispatch::Dispatcher;
use lifecycle::{Config, LifecycleError};
use listener::{ListenCtx, Listener};

/// Start a coordinator and run it to completion (i.e. until it receives
/// a `Shutdown` command).
pub async fn run(codec: Arc<dyn ObjectCodec>) -> Result<(), LifecycleError> {
    let config = Config::load()?;
    run_with_config(config, codec).await
}

pub async fn run_with_config(
    config: Config,
    codec: Arc<dyn ObjectCodec>,
) -> Result<(), LifecycleError> {
    let channel_capacity = config.channel_capacity;
    let drain_timeout = env::drain_timeout();

    let start_time = std::time::Instant::now();
    let started = lifecycle::startup(config).await?;
    let (command_tx, command_rx) = mpsc::channel(channel_capacity);
    let shutdown = Arc::new(Notify::new());

    let ctx = Arc::new(ListenCtx { command_tx, shutdown: Arc::clone(&shutdown) });

    let listener = Listener::new(started.listener, ctx);
    let dispatcher = Dispatcher::new(codec, start_time);
    let sot = Arc::clone(&started.state.sot);

    let loop_handle = tokio::spawn(main_loop::run(
        command_rx,
        sot,
        dispatcher,
        Arc::clone(&shutdown),
        drain_timeout,
    ));

    tokio::select! {
        _ = listener.run() => {}
        _ = shutdown.notified() => {
            info!("shutdown signaled, stopping listener");
        }
    }

    let _ = loop_handle.await;
    started.state.shutdown();
    Ok(())
}

// SPDX-License-Identifier: MIT

//! The public `Share` container (spec §4.4): a transparent, cross-process
//! shared object whose lifecycle a caller drives explicitly with
//! [`Share::start`] and [`Share::stop`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use share_adapters::{ObjectCodec, ProcessSpawner, Shareable};
use share_core::{EntryName, ShareError, StatusReport};
use share_sot::Sot;
use share_wire::{CommandKind, ReplyKind};
use tracing::warn;

use crate::client::ShareClient;
use crate::handle::SharedHandle;
use crate::proxy::{self, ObjectProxy};

/// Where a `Share`'s coordinator lives on disk, and how it is launched.
#[derive(Debug, Clone)]
pub struct ShareConfig {
    pub state_dir: PathBuf,
    pub coordinator_binary: PathBuf,
    pub timeout: Duration,
}

impl ShareConfig {
    pub fn socket_path(&self) -> PathBuf {
        self.state_dir.join("coordinator.sock")
    }

    pub fn shmem_flink(&self) -> PathBuf {
        self.state_dir.join("coordinator.shm")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.state_dir.join("coordinator.lock")
    }
}

/// The monotonic lifecycle states a `Share` moves through (spec §4.4.3).
/// Once `Errored`, a container never recovers on its own; the caller must
/// `stop()` and `start()` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    Stopped,
    Errored,
}

/// A transparent shared-object container. Cloning a `Share` is cheap and
/// shares the same underlying connection and shared-memory mapping; the
/// type is meant to be handed to worker tasks via `Arc<Share>` or cloned
/// directly, since every field is itself shared.
pub struct Share {
    codec: Arc<dyn ObjectCodec>,
    spawner: Arc<dyn ProcessSpawner>,
    config: ShareConfig,
    state: Arc<RwLock<LifecycleState>>,
    client: RwLock<Option<Arc<ShareClient>>>,
    sot: RwLock<Option<Arc<Sot>>>,
}

impl Share {
    pub fn new(codec: Arc<dyn ObjectCodec>, spawner: Arc<dyn ProcessSpawner>, config: ShareConfig) -> Self {
        Self {
            codec,
            spawner,
            config,
            state: Arc::new(RwLock::new(LifecycleState::Uninitialized)),
            client: RwLock::new(None),
            sot: RwLock::new(None),
        }
    }

    /// Build a `Share` that attaches to an already-running coordinator
    /// instead of owning its lifecycle from scratch (spec §4.4.6). The
    /// caller still must call [`Share::start`] to actually connect.
    pub fn from_handle(
        handle: SharedHandle,
        codec: Arc<dyn ObjectCodec>,
        spawner: Arc<dyn ProcessSpawner>,
        coordinator_binary: PathBuf,
    ) -> Self {
        let config = ShareConfig {
            state_dir: handle.state_dir,
            coordinator_binary,
            timeout: handle.timeout(),
        };
        Self::new(codec, spawner, config)
    }

    /// Produce the transport form of this running `Share` so a worker
    /// process can attach to the same coordinator (spec §4.4.6).
    pub fn handle(&self) -> Result<SharedHandle, ShareError> {
        if !self.is_running() {
            return Err(ShareError::CoordinatorUnavailable);
        }
        Ok(SharedHandle {
            state_dir: self.config.state_dir.clone(),
            socket_path: self.config.socket_path(),
            shmem_flink: self.config.shmem_flink(),
            lock_path: self.config.lock_path(),
            timeout_ms: self.config.timeout.as_millis() as u64,
        })
    }

    /// Ensure a coordinator is running, attach to its shared memory and
    /// command channel. Idempotent: calling `start()` on an already
    /// running `Share` is a no-op.
    pub async fn start(&self) -> Result<(), ShareError> {
        if self.is_running() {
            return Ok(());
        }

        self.spawner
            .ensure_coordinator_running(
                &self.config.coordinator_binary,
                &self.config.state_dir,
                &self.config.lock_path(),
            )
            .await
            .map_err(|e| ShareError::CoordinatorError(e.to_string()))?;

        let sot = open_sot_with_retry(&self.config.shmem_flink(), self.config.timeout).await?;
        wait_for_socket(&self.config.socket_path(), self.config.timeout).await?;
        let client = Arc::new(ShareClient::new(
            self.config.socket_path(),
            self.config.timeout,
            Arc::clone(&self.state),
        ));

        *self.sot.write() = Some(Arc::new(sot));
        *self.client.write() = Some(client);
        *self.state.write() = LifecycleState::Running;
        Ok(())
    }

    /// Ask the coordinator to shut down. Returns `true` whether or not it
    /// was reachable: a coordinator that has already crashed is, from the
    /// caller's point of view, already stopped (spec S5). An `Errored`
    /// container is attached (it still holds a client and SoT mapping) so
    /// it is stopped the same way a `Running` one is.
    pub async fn stop(&self) -> Result<bool, ShareError> {
        if !matches!(*self.state.read(), LifecycleState::Running | LifecycleState::Errored) {
            return Ok(true);
        }
        if let Some(client) = self.client.read().clone() {
            let _ = client.send_only(CommandKind::Shutdown).await;
        }
        *self.client.write() = None;
        *self.sot.write() = None;
        *self.state.write() = LifecycleState::Stopped;
        Ok(true)
    }

    /// Stop the coordinator and mark this `Share` unusable. Unlike
    /// `stop()`, an `exit()`ed container's state does not transition back
    /// through `start()`; it stays `Stopped`, matching spec §4.4.3's
    /// "terminal" exit.
    pub async fn exit(&self) -> Result<(), ShareError> {
        self.stop().await.map(|_| ())
    }

    pub fn is_running(&self) -> bool {
        *self.state.read() == LifecycleState::Running
    }

    pub fn has_error(&self) -> bool {
        *self.state.read() == LifecycleState::Errored
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.read()
    }

    /// Round-trip diagnostics snapshot from the coordinator (uptime, entry
    /// count, global version). Unlike `is_running`/`has_error`, which are
    /// cheap local checks of this process's own view, this always asks
    /// the coordinator directly.
    pub async fn status(&self) -> Result<StatusReport, ShareError> {
        let client = self.require_client()?;
        let reply = client.send_and_wait(CommandKind::Status).await?;
        match reply.kind {
            ReplyKind::Ok { payload, .. } => bincode::deserialize(&payload)
                .map_err(|e| ShareError::CoordinatorError(e.to_string())),
            ReplyKind::Exception { .. } => {
                Err(ShareError::CoordinatorError("status returned an exception".to_string()))
            }
            ReplyKind::Marker { marker } => Err(marker.into()),
        }
    }

    /// Remove every entry from the container (spec §4.4.4).
    pub async fn clear(&self) -> Result<(), ShareError> {
        let client = self.require_client()?;
        let reply = client.send_and_wait(CommandKind::Clear).await?;
        match reply.kind {
            ReplyKind::Ok { .. } | ReplyKind::Exception { .. } => Ok(()),
            ReplyKind::Marker { marker } => Err(marker.into()),
        }
    }

    /// Re-establish every live resource behind this container's entries
    /// against `encoded_auth` (spec §4.4.6, S7). Returns the coordinator's
    /// encoded report of what was reconnected.
    pub async fn reconnect_all(&self, encoded_auth: Vec<u8>) -> Result<Vec<u8>, ShareError> {
        let client = self.require_client()?;
        let reply = client.send_and_wait(CommandKind::ReconnectAll { encoded_auth }).await?;
        match reply.kind {
            ReplyKind::Ok { payload, .. } | ReplyKind::Exception { payload, .. } => Ok(payload),
            ReplyKind::Marker { marker } => Err(marker.into()),
        }
    }

    /// Install `object` under `name`, replacing whatever was there (spec
    /// §4.4.2 assignment). Blocks until the write is visible to this
    /// process's own fast-path reads.
    pub async fn set(&self, name: &str, object: &dyn Shareable) -> Result<(), ShareError> {
        let name = EntryName::validate(name)?;
        let client = self.require_client()?;
        let sot = self.require_sot()?;
        let encoded = self.codec.encode(object).map_err(|e| ShareError::UnsupportedShareType(e.to_string()))?;
        let bytes = bincode::serialize(&encoded).map_err(|e| ShareError::CoordinatorError(e.to_string()))?;
        proxy::set(&client, &sot, &name, bytes, self.config.timeout).await
    }

    pub async fn delete(&self, name: &str) -> Result<(), ShareError> {
        let name = EntryName::validate(name)?;
        let client = self.require_client()?;
        let sot = self.require_sot()?;
        proxy::delete(&client, &sot, &name, self.config.timeout).await
    }

    /// `name in s` (spec §4.4.4): whether an entry currently exists,
    /// checked against this process's local shared-memory view.
    pub fn contains(&self, name: &str) -> bool {
        let Ok(name) = EntryName::validate(name) else {
            return false;
        };
        let Some(sot) = self.sot.read().clone() else {
            return false;
        };
        sot.get(&name).is_some()
    }

    /// A proxy onto the entry named `name`, for fast-path reads and
    /// coordinator-mediated method calls.
    pub fn entry(&self, name: &str) -> Result<ObjectProxy, ShareError> {
        let name = EntryName::validate(name)?;
        let client = self.require_client()?;
        let sot = self.require_sot()?;
        Ok(ObjectProxy::new(client, sot, Arc::clone(&self.codec), name, self.config.timeout))
    }

    fn require_client(&self) -> Result<Arc<ShareClient>, ShareError> {
        self.client.read().clone().ok_or(ShareError::CoordinatorUnavailable)
    }

    fn require_sot(&self) -> Result<Arc<Sot>, ShareError> {
        self.sot.read().clone().ok_or(ShareError::CoordinatorUnavailable)
    }
}

impl Drop for Share {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("Share dropped while running; call stop() explicitly to shut down the coordinator cleanly");
        }
    }
}

async fn open_sot_with_retry(flink: &std::path::Path, timeout: Duration) -> Result<Sot, ShareError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match Sot::open(flink) {
            Ok(sot) => return Ok(sot),
            Err(_) if tokio::time::Instant::now() < deadline => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Err(e) => return Err(ShareError::CoordinatorError(e.to_string())),
        }
    }
}

/// The shared-memory region and the control socket come up in that
/// order during coordinator startup, so this usually returns on its
/// first check; it only matters right after a fresh spawn.
async fn wait_for_socket(socket_path: &std::path::Path, timeout: Duration) -> Result<(), ShareError> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if socket_path.exists() {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(ShareError::CoordinatorUnavailable);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use share_adapters::{BincodeCodec, CallError, CallResult, CodecError, SpawnError};
    use share_core::{AttributePath, SharedMeta};

    struct NoopSpawner;

    #[async_trait]
    impl ProcessSpawner for NoopSpawner {
        fn is_coordinator_running(&self, _lock_path: &std::path::Path) -> bool {
            false
        }

        async fn ensure_coordinator_running(
            &self,
            _binary: &std::path::Path,
            _state_dir: &std::path::Path,
            _lock_path: &std::path::Path,
        ) -> Result<(), SpawnError> {
            Err(SpawnError::LaunchFailed("no coordinator in this test".to_string()))
        }
    }

    #[tokio::test]
    async fn start_surfaces_spawn_failure_as_coordinator_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let share = Share::new(
            Arc::new(BincodeCodec::new()),
            Arc::new(NoopSpawner),
            ShareConfig {
                state_dir: dir.path().to_path_buf(),
                coordinator_binary: dir.path().join("does-not-exist"),
                timeout: Duration::from_millis(50),
            },
        );
        assert!(share.start().await.is_err());
        assert!(!share.is_running());
    }

    #[tokio::test]
    async fn operations_before_start_report_coordinator_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let share = Share::new(
            Arc::new(BincodeCodec::new()),
            Arc::new(NoopSpawner),
            ShareConfig {
                state_dir: dir.path().to_path_buf(),
                coordinator_binary: dir.path().join("does-not-exist"),
                timeout: Duration::from_millis(50),
            },
        );
        assert_eq!(share.entry("x").unwrap_err(), ShareError::CoordinatorUnavailable);
        assert!(!share.contains("x"));
        assert!(share.stop().await.unwrap());
    }

    #[tokio::test]
    async fn set_rejects_a_reserved_name_before_touching_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let share = Share::new(
            Arc::new(BincodeCodec::new()),
            Arc::new(NoopSpawner),
            ShareConfig {
                state_dir: dir.path().to_path_buf(),
                coordinator_binary: dir.path().join("does-not-exist"),
                timeout: Duration::from_millis(50),
            },
        );
        struct Dummy;
        impl Shareable for Dummy {
            fn class_name(&self) -> &'static str {
                "dummy"
            }
            fn shared_meta(&self) -> SharedMeta {
                SharedMeta::default()
            }
            fn encode_self(&self) -> Result<Vec<u8>, CodecError> {
                Ok(vec![])
            }
            fn call(
                &mut self,
                _path: &AttributePath,
                _method: &str,
                _args: &[u8],
            ) -> Result<CallResult, CallError> {
                Err(CallError::NoSuchMethod { class: "dummy", method: "x".to_string() })
            }
            fn get_path(&self, _path: &AttributePath) -> Result<Vec<u8>, CallError> {
                Ok(vec![])
            }
        }
        let err = share.set("_reserved", &Dummy).await.unwrap_err();
        assert_eq!(err, ShareError::InvalidShareName("_reserved".to_string()));
    }
}

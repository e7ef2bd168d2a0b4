//! Scheduled clipboard synchronization
//!
//! [`SyncManager`] owns the running/stopped lifecycle, a timer-driven
//! background worker, and the change-detection fingerprint. HTTP handlers
//! call into it concurrently with the worker, so all shared state sits
//! behind one mutex and each sync attempt holds it for the whole
//! read-compare-upload sequence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::clipboard::ClipboardAccessor;
use crate::config::SyncConfig;
use crate::remote::{RemoteError, RemoteStore};

/// Remote file the clipboard is mirrored to
const REMOTE_PATH: &str = "clipboard.txt";

/// Manager lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No worker is running
    Stopped,
    /// A worker is ticking at the configured interval
    Running,
}

struct Inner {
    state: LifecycleState,
    config: SyncConfig,
    remote: Option<Arc<dyn RemoteStore>>,
    /// Digest of the last successfully uploaded content; `None` until the
    /// first upload. Not persisted across restarts.
    fingerprint: Option<String>,
    /// Token for the current worker; a fresh one is issued per start.
    cancel: CancellationToken,
}

/// Timer-driven clipboard-to-remote synchronization manager
pub struct SyncManager {
    inner: Arc<Mutex<Inner>>,
    accessor: Arc<ClipboardAccessor>,
}

impl SyncManager {
    /// Create a stopped manager
    pub fn new(
        config: SyncConfig,
        remote: Option<Arc<dyn RemoteStore>>,
        accessor: Arc<ClipboardAccessor>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: LifecycleState::Stopped,
                config,
                remote,
                fingerprint: None,
                cancel: CancellationToken::new(),
            })),
            accessor,
        }
    }

    /// Start the scheduled sync worker
    ///
    /// No-op when already running. Also a no-op, with a logged reason, when
    /// sync is disabled in the configuration or no remote store is bound.
    pub async fn start(&self) {
        let mut inner = self.inner.lock().await;

        if inner.state == LifecycleState::Running {
            debug!("sync manager already running");
            return;
        }
        if !inner.config.enabled {
            info!("sync is disabled in config, not starting");
            return;
        }
        if inner.remote.is_none() {
            info!("remote store not configured, not starting");
            return;
        }

        self.spawn_worker(&mut inner);
    }

    /// Stop the scheduled sync worker
    ///
    /// Cancels the pending timer wait; an in-flight sync attempt completes
    /// on its own. Safe to call on a stopped manager, repeatedly, and never
    /// blocks on a worker rendezvous.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;

        if inner.state == LifecycleState::Stopped {
            return;
        }

        inner.cancel.cancel();
        inner.state = LifecycleState::Stopped;
        info!("stopping auto-sync");
    }

    /// Whether the scheduled worker is running
    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.state == LifecycleState::Running
    }

    /// Perform one manual synchronization
    ///
    /// Works in any lifecycle state. Unlike the scheduled path this always
    /// uploads, even when the content matches the current fingerprint, and
    /// read/upload errors are returned to the caller.
    pub async fn sync_now(&self) -> crate::Result<()> {
        let mut inner = self.inner.lock().await;

        let remote = match &inner.remote {
            Some(remote) => Arc::clone(remote),
            None => return Err(RemoteError::NotConfigured.into()),
        };

        let content = self.accessor.read().await?;
        remote.upload(REMOTE_PATH, &content).await?;
        inner.fingerprint = Some(fingerprint_of(&content));

        info!(bytes = content.len(), "manual sync completed");
        Ok(())
    }

    /// Swap configuration and remote store, restarting the worker if needed
    ///
    /// Both are replaced wholesale under the state lock so the worker never
    /// observes a half-updated configuration. A manager that was running is
    /// restarted only when the new configuration still enables sync; a
    /// manager at rest stays at rest regardless of the new configuration.
    pub async fn reconfigure(&self, config: SyncConfig, remote: Option<Arc<dyn RemoteStore>>) {
        let mut inner = self.inner.lock().await;

        let was_running = inner.state == LifecycleState::Running;
        if was_running {
            inner.cancel.cancel();
            inner.state = LifecycleState::Stopped;
        }

        inner.config = config;
        inner.remote = remote;

        if was_running && inner.config.enabled && inner.remote.is_some() {
            self.spawn_worker(&mut inner);
        }
    }

    /// Spawn the background worker and mark the manager running
    fn spawn_worker(&self, inner: &mut Inner) {
        if inner.config.sync_interval == 0 {
            warn!("sync interval must be positive, not starting");
            return;
        }

        let token = CancellationToken::new();
        inner.cancel = token.clone();
        inner.state = LifecycleState::Running;

        let period = Duration::from_secs(inner.config.sync_interval);
        let shared = Arc::clone(&self.inner);
        let accessor = Arc::clone(&self.accessor);

        info!(
            interval_secs = inner.config.sync_interval,
            "starting auto-sync"
        );

        tokio::spawn(async move {
            // First tick one full period out, matching the configured cadence.
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("sync worker exiting");
                        break;
                    }
                    _ = ticker.tick() => {
                        sync_once(&shared, &accessor).await;
                    }
                }
            }
        });
    }
}

/// One scheduled sync attempt
///
/// Errors are logged and swallowed; the worker keeps running and retries on
/// the next tick. The fingerprint advances only after a successful upload,
/// so a failed upload is retried with the same content.
async fn sync_once(inner: &Arc<Mutex<Inner>>, accessor: &ClipboardAccessor) {
    let mut guard = inner.lock().await;

    let remote = match &guard.remote {
        Some(remote) => Arc::clone(remote),
        None => return,
    };

    let content = match accessor.read().await {
        Ok(content) => content,
        Err(e) => {
            warn!("failed to read clipboard: {e}");
            return;
        }
    };

    let digest = fingerprint_of(&content);
    if guard.fingerprint.as_deref() == Some(digest.as_str()) {
        return;
    }

    if let Err(e) = remote.upload(REMOTE_PATH, &content).await {
        warn!("failed to upload clipboard: {e}");
        return;
    }

    guard.fingerprint = Some(digest);
    info!(bytes = content.len(), "synced clipboard content");
}

fn fingerprint_of(content: &str) -> String {
    format!("{:x}", md5::compute(content.as_bytes()))
}

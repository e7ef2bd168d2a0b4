//! Integration tests for the sync manager lifecycle and the clipboard
//! access strategy chain.
//!
//! Timer behavior is tested on tokio's paused clock, so tick counts are
//! exact rather than sleep-and-hope estimates.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use syncboard::clipboard::{
    android::KeystrokeWrite, ClipboardAccessor, ClipboardError, ReadStrategy, WriteStrategy,
};
use syncboard::config::SyncConfig;
use syncboard::remote::{RemoteError, RemoteStore};
use syncboard::sync::SyncManager;
use syncboard::Error;

/// Read strategy that always fails
struct FailingRead {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ReadStrategy for FailingRead {
    fn name(&self) -> &str {
        "failing"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClipboardError::Method("permission denied".to_string()))
    }
}

/// Read strategy that returns a fixed string
struct StaticRead {
    content: &'static str,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ReadStrategy for StaticRead {
    fn name(&self) -> &str {
        "static"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.content.to_string())
    }
}

/// Read strategy whose content the test can change between ticks
#[derive(Clone)]
struct ScriptedRead {
    content: Arc<Mutex<String>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedRead {
    fn new(initial: &str) -> Self {
        Self {
            content: Arc::new(Mutex::new(initial.to_string())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn set(&self, content: &str) {
        *self.content.lock().unwrap() = content.to_string();
    }
}

#[async_trait]
impl ReadStrategy for ScriptedRead {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn read(&self) -> Result<String, ClipboardError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.content.lock().unwrap().clone())
    }
}

/// Write strategy that records what it was asked to write
struct RecordingWrite {
    writes: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl WriteStrategy for RecordingWrite {
    fn name(&self) -> &str {
        "recording"
    }

    async fn write(&self, content: &str) -> Result<(), ClipboardError> {
        self.writes.lock().unwrap().push(content.to_string());
        Ok(())
    }
}

/// Remote store that records successful uploads and can be made to fail
#[derive(Default)]
struct RecordingStore {
    uploads: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingStore {
    fn uploaded_contents(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(_, content)| content.clone())
            .collect()
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn upload(&self, remote_path: &str, content: &str) -> Result<(), RemoteError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Upload("remote unreachable".to_string()));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((remote_path.to_string(), content.to_string()));
        Ok(())
    }

    async fn download(&self, _remote_path: &str) -> Result<String, RemoteError> {
        self.uploads
            .lock()
            .unwrap()
            .last()
            .map(|(_, content)| content.clone())
            .ok_or_else(|| RemoteError::Download("nothing uploaded".to_string()))
    }

    async fn test_connection(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

fn enabled_config(interval: u64) -> SyncConfig {
    SyncConfig {
        webdav_url: "https://dav.example.com".to_string(),
        webdav_username: "user".to_string(),
        webdav_password: "pass".to_string(),
        sync_interval: interval,
        enabled: true,
    }
}

fn scripted_manager(
    clipboard: &ScriptedRead,
    interval: u64,
) -> (SyncManager, Arc<RecordingStore>) {
    let accessor = Arc::new(ClipboardAccessor::new(
        vec![Box::new(clipboard.clone())],
        vec![],
    ));
    let store = Arc::new(RecordingStore::default());
    let manager = SyncManager::new(enabled_config(interval), Some(store.clone()), accessor);
    (manager, store)
}

#[tokio::test]
async fn test_read_fallback_order() {
    let failing_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));
    let third_calls = Arc::new(AtomicUsize::new(0));
    let fourth_calls = Arc::new(AtomicUsize::new(0));

    let accessor = ClipboardAccessor::new(
        vec![
            Box::new(FailingRead {
                calls: failing_calls.clone(),
            }),
            Box::new(StaticRead {
                content: "X",
                calls: second_calls.clone(),
            }),
            Box::new(StaticRead {
                content: "Y",
                calls: third_calls.clone(),
            }),
            Box::new(StaticRead {
                content: "Z",
                calls: fourth_calls.clone(),
            }),
        ],
        vec![],
    );

    assert_eq!(accessor.read().await.unwrap(), "X");
    assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
    assert_eq!(third_calls.load(Ordering::SeqCst), 0);
    assert_eq!(fourth_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_read_skips_empty_content() {
    let accessor = ClipboardAccessor::new(
        vec![
            Box::new(StaticRead {
                content: "",
                calls: Arc::new(AtomicUsize::new(0)),
            }),
            Box::new(StaticRead {
                content: "fallback",
                calls: Arc::new(AtomicUsize::new(0)),
            }),
        ],
        vec![],
    );

    assert_eq!(accessor.read().await.unwrap(), "fallback");
}

#[tokio::test]
async fn test_read_all_methods_failed() {
    let accessor = ClipboardAccessor::new(
        vec![Box::new(FailingRead {
            calls: Arc::new(AtomicUsize::new(0)),
        })],
        vec![],
    );

    assert!(matches!(
        accessor.read().await,
        Err(ClipboardError::AccessDenied)
    ));
}

#[tokio::test]
async fn test_write_multiline_rejected_by_keystroke_method() {
    let accessor = ClipboardAccessor::new(vec![], vec![Box::new(KeystrokeWrite)]);

    assert!(matches!(
        accessor.write("a\nb").await,
        Err(ClipboardError::UnsupportedContent(_))
    ));
}

#[tokio::test]
async fn test_write_first_success_wins() {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let accessor = ClipboardAccessor::new(
        vec![],
        vec![Box::new(RecordingWrite {
            writes: writes.clone(),
        })],
    );

    accessor.write("hello").await.unwrap();
    assert_eq!(*writes.lock().unwrap(), vec!["hello".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_start_is_idempotent() {
    let clipboard = ScriptedRead::new("X");
    let (manager, store) = scripted_manager(&clipboard, 1);

    manager.start().await;
    manager.start().await;
    assert!(manager.is_running().await);

    // Three full periods; a duplicated worker would double the read count.
    sleep(Duration::from_millis(3500)).await;

    assert_eq!(clipboard.calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.uploaded_contents(), vec!["X".to_string()]);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_change_detection_end_to_end() {
    let clipboard = ScriptedRead::new("foo");
    let (manager, store) = scripted_manager(&clipboard, 1);

    manager.start().await;

    // First tick uploads "foo"; the second sees unchanged content.
    sleep(Duration::from_millis(2500)).await;
    assert_eq!(store.uploaded_contents(), vec!["foo".to_string()]);

    clipboard.set("bar");
    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        store.uploaded_contents(),
        vec!["foo".to_string(), "bar".to_string()]
    );

    // Three more ticks with stable content produce no further uploads.
    sleep(Duration::from_secs(3)).await;
    assert_eq!(
        store.uploaded_contents(),
        vec!["foo".to_string(), "bar".to_string()]
    );

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_upload_retries_same_content() {
    let clipboard = ScriptedRead::new("foo");
    let (manager, store) = scripted_manager(&clipboard, 1);
    store.fail.store(true, Ordering::SeqCst);

    manager.start().await;
    sleep(Duration::from_millis(1500)).await;

    // The upload failed, so the fingerprint must not have advanced.
    assert_eq!(store.attempts.load(Ordering::SeqCst), 1);
    assert!(store.uploaded_contents().is_empty());

    store.fail.store(false, Ordering::SeqCst);
    sleep(Duration::from_secs(1)).await;

    assert_eq!(store.attempts.load(Ordering::SeqCst), 2);
    assert_eq!(store.uploaded_contents(), vec!["foo".to_string()]);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_read_failure_keeps_worker_alive() {
    let calls = Arc::new(AtomicUsize::new(0));
    let accessor = Arc::new(ClipboardAccessor::new(
        vec![Box::new(FailingRead {
            calls: calls.clone(),
        })],
        vec![],
    ));
    let store = Arc::new(RecordingStore::default());
    let manager = SyncManager::new(enabled_config(1), Some(store.clone()), accessor);

    manager.start().await;
    sleep(Duration::from_millis(2500)).await;

    // Two ticks, two failed reads, no uploads, still running.
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.attempts.load(Ordering::SeqCst), 0);
    assert!(manager.is_running().await);

    manager.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_without_start_and_double_stop() {
    let clipboard = ScriptedRead::new("X");
    let (manager, _store) = scripted_manager(&clipboard, 1);

    // Must return promptly even though no worker was ever spawned.
    tokio::time::timeout(Duration::from_secs(5), manager.stop())
        .await
        .expect("stop on a never-started manager blocked");

    manager.start().await;
    manager.stop().await;
    tokio::time::timeout(Duration::from_secs(5), manager.stop())
        .await
        .expect("double stop blocked");

    assert!(!manager.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_ticking() {
    let clipboard = ScriptedRead::new("X");
    let (manager, _store) = scripted_manager(&clipboard, 1);

    manager.start().await;
    sleep(Duration::from_millis(1500)).await;
    manager.stop().await;

    let reads_at_stop = clipboard.calls.load(Ordering::SeqCst);
    sleep(Duration::from_secs(3)).await;
    assert_eq!(clipboard.calls.load(Ordering::SeqCst), reads_at_stop);
}

#[tokio::test]
async fn test_start_noop_when_disabled_or_unconfigured() {
    let clipboard = ScriptedRead::new("X");
    let accessor = Arc::new(ClipboardAccessor::new(
        vec![Box::new(clipboard.clone())],
        vec![],
    ));

    let mut disabled = enabled_config(1);
    disabled.enabled = false;
    let manager = SyncManager::new(
        disabled,
        Some(Arc::new(RecordingStore::default())),
        accessor.clone(),
    );
    manager.start().await;
    assert!(!manager.is_running().await);

    let manager = SyncManager::new(enabled_config(1), None, accessor);
    manager.start().await;
    assert!(!manager.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_does_not_start_a_stopped_manager() {
    let clipboard = ScriptedRead::new("X");
    let (manager, _store) = scripted_manager(&clipboard, 1);

    let new_store: Arc<RecordingStore> = Arc::new(RecordingStore::default());
    manager
        .reconfigure(enabled_config(1), Some(new_store.clone()))
        .await;

    assert!(!manager.is_running().await);
    sleep(Duration::from_secs(3)).await;
    assert_eq!(new_store.attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_disabling_stops_a_running_manager() {
    let clipboard = ScriptedRead::new("X");
    let (manager, _store) = scripted_manager(&clipboard, 1);

    manager.start().await;
    assert!(manager.is_running().await);

    let mut disabled = enabled_config(1);
    disabled.enabled = false;
    manager
        .reconfigure(disabled, Some(Arc::new(RecordingStore::default())))
        .await;

    assert!(!manager.is_running().await);
}

#[tokio::test(start_paused = true)]
async fn test_reconfigure_restarts_with_new_interval_and_store() {
    let clipboard = ScriptedRead::new("X");
    let (manager, old_store) = scripted_manager(&clipboard, 1);

    manager.start().await;
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(old_store.attempts.load(Ordering::SeqCst), 1);

    let new_store: Arc<RecordingStore> = Arc::new(RecordingStore::default());
    manager
        .reconfigure(enabled_config(2), Some(new_store.clone()))
        .await;
    assert!(manager.is_running().await);
    clipboard.set("Y");

    // The old one-second cadence is gone; nothing fires in the next 1.5s.
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(new_store.attempts.load(Ordering::SeqCst), 0);

    // The first tick at the new two-second cadence lands on the new store.
    sleep(Duration::from_secs(1)).await;
    assert_eq!(new_store.uploaded_contents(), vec!["Y".to_string()]);
    assert_eq!(old_store.attempts.load(Ordering::SeqCst), 1);

    manager.stop().await;
}

#[tokio::test]
async fn test_sync_now_without_remote_reads_nothing() {
    let clipboard = ScriptedRead::new("X");
    let accessor = Arc::new(ClipboardAccessor::new(
        vec![Box::new(clipboard.clone())],
        vec![],
    ));
    let manager = SyncManager::new(enabled_config(1), None, accessor);

    let result = manager.sync_now().await;
    assert!(matches!(
        result,
        Err(Error::Remote(RemoteError::NotConfigured))
    ));
    assert_eq!(clipboard.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sync_now_always_uploads() {
    let clipboard = ScriptedRead::new("same");
    let (manager, store) = scripted_manager(&clipboard, 1);

    manager.sync_now().await.unwrap();
    manager.sync_now().await.unwrap();

    // Manual sync skips change detection, so both calls hit the remote.
    assert_eq!(
        store.uploaded_contents(),
        vec!["same".to_string(), "same".to_string()]
    );
    assert_eq!(
        store.uploads.lock().unwrap()[0].0,
        "clipboard.txt".to_string()
    );
}

#[tokio::test]
async fn test_sync_now_surfaces_read_errors() {
    let accessor = Arc::new(ClipboardAccessor::new(
        vec![Box::new(FailingRead {
            calls: Arc::new(AtomicUsize::new(0)),
        })],
        vec![],
    ));
    let manager = SyncManager::new(
        enabled_config(1),
        Some(Arc::new(RecordingStore::default())),
        accessor,
    );

    assert!(matches!(
        manager.sync_now().await,
        Err(Error::Clipboard(ClipboardError::AccessDenied))
    ));
}

#[tokio::test]
async fn test_sync_now_surfaces_upload_errors() {
    let clipboard = ScriptedRead::new("payload");
    let (manager, store) = scripted_manager(&clipboard, 1);
    store.fail.store(true, Ordering::SeqCst);

    assert!(matches!(
        manager.sync_now().await,
        Err(Error::Remote(RemoteError::Upload(_)))
    ));
}

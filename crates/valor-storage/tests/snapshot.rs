use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use valor_core::models::message::{Message, MessageContent};
use valor_storage::error::StorageError;
use valor_storage::flush::{flush_now, restore_from, spawn_flush_task};
use valor_storage::snapshot::{
    JsonFileSnapshotStore, NoopSnapshotStore, SessionSnapshot, SnapshotStore,
};
use valor_storage::store::{MemorySessionStore, SessionStore};

fn populated_store() -> MemorySessionStore {
    let store = MemorySessionStore::new("sys", 16).unwrap();
    store
        .append_exchange("alice", Message::user("hi"), Message::assistant("hello"))
        .unwrap();
    store
        .append_user_message("bob", MessageContent::from("yo"))
        .unwrap();
    store
}

/// Records every snapshot it is asked to save.
#[derive(Default)]
struct RecordingSnapshots {
    saved: Mutex<Vec<SessionSnapshot>>,
}

#[async_trait]
impl SnapshotStore for RecordingSnapshots {
    async fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        Ok(self.saved.lock().unwrap().last().cloned())
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        self.saved.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

#[tokio::test]
async fn missing_file_loads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = JsonFileSnapshotStore::new(dir.path().join("sessions.json"));
    assert!(snapshots.load().await.unwrap().is_none());
}

#[tokio::test]
async fn json_file_save_then_load_restores_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("sessions.json");
    let snapshots = JsonFileSnapshotStore::new(&path);

    let store = populated_store();
    let saved = flush_now(&store, &snapshots).await.unwrap();
    assert_eq!(saved, 2);
    assert!(path.exists());
    assert!(!dir.path().join("nested").join("sessions.json.tmp").exists());

    let restored = MemorySessionStore::new("sys", 16).unwrap();
    let count = restore_from(&restored, &snapshots).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(restored.get("alice"), store.get("alice"));
    assert_eq!(restored.get("bob").len(), 2);
}

#[tokio::test]
async fn save_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshots = JsonFileSnapshotStore::new(dir.path().join("sessions.json"));

    let store = populated_store();
    flush_now(&store, &snapshots).await.unwrap();
    store.restore(SessionSnapshot::default());
    flush_now(&store, &snapshots).await.unwrap();

    let loaded = snapshots.load().await.unwrap().unwrap();
    assert!(loaded.sessions.is_empty());
}

#[tokio::test]
async fn corrupt_file_is_a_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    std::fs::write(&path, b"{ not json").unwrap();

    let err = JsonFileSnapshotStore::new(&path).load().await.unwrap_err();
    assert!(matches!(err, StorageError::Serialization(_)));
}

#[tokio::test]
async fn noop_store_never_returns_anything() {
    let store = populated_store();
    flush_now(&store, &NoopSnapshotStore).await.unwrap();
    assert!(NoopSnapshotStore.load().await.unwrap().is_none());
    assert_eq!(restore_from(&store, &NoopSnapshotStore).await.unwrap(), 0);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn flush_task_saves_periodically() {
    let store: Arc<dyn SessionStore> = Arc::new(populated_store());
    let recording = Arc::new(RecordingSnapshots::default());
    let snapshots: Arc<dyn SnapshotStore> = recording.clone();

    let task = spawn_flush_task(store, snapshots, Duration::from_millis(20));

    let mut waited = Duration::ZERO;
    while recording.saved.lock().unwrap().len() < 2 && waited < Duration::from_secs(5) {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    task.shutdown().await;

    let saved = recording.saved.lock().unwrap();
    assert!(saved.len() >= 2);
    assert_eq!(saved[0].sessions.len(), 2);
}

#[tokio::test]
async fn shutdown_stops_further_saves() {
    let store: Arc<dyn SessionStore> = Arc::new(populated_store());
    let recording = Arc::new(RecordingSnapshots::default());
    let snapshots: Arc<dyn SnapshotStore> = recording.clone();

    let task = spawn_flush_task(store, snapshots, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(50)).await;
    task.shutdown().await;

    let after_shutdown = recording.saved.lock().unwrap().len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(recording.saved.lock().unwrap().len(), after_shutdown);
}

#[tokio::test]
async fn corrupt_snapshot_is_set_aside_not_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions.json");
    std::fs::write(&path, b"{ not json").unwrap();
    let snapshots = JsonFileSnapshotStore::new(&path);

    let store = MemorySessionStore::new("sys", 16).unwrap();
    assert_eq!(restore_from(&store, &snapshots).await.unwrap(), 0);
    assert!(store.is_empty());

    let corrupt = snapshots.corrupt_path();
    assert_eq!(corrupt, dir.path().join("sessions.json.corrupt"));
    assert_eq!(std::fs::read(&corrupt).unwrap(), b"{ not json");
    assert!(!path.exists());

    store
        .append_exchange("alice", Message::user("hi"), Message::assistant("hello"))
        .unwrap();
    flush_now(&store, &snapshots).await.unwrap();
    assert_eq!(std::fs::read(&corrupt).unwrap(), b"{ not json");
    assert_eq!(snapshots.load().await.unwrap().unwrap().sessions.len(), 1);
}

#[tokio::test]
async fn unreadable_snapshot_location_is_reported_and_left_alone() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be: reading fails with an I/O error.
    let path = dir.path().join("sessions.json");
    std::fs::create_dir(&path).unwrap();
    let snapshots = JsonFileSnapshotStore::new(&path);

    let store = MemorySessionStore::new("sys", 16).unwrap();
    let err = restore_from(&store, &snapshots).await.unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
    assert!(path.is_dir());
    assert!(!snapshots.corrupt_path().exists());
}

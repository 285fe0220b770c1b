use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;
use valor_core::models::session::Session;

use crate::error::StorageError;

/// Serialized form of the whole session map, least recently used first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub sessions: Vec<Session>,
}

/// Persistence port for session snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the last saved snapshot. `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<SessionSnapshot>, StorageError>;

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError>;

    /// Move an unreadable snapshot out of the way so the next save does not
    /// replace it. Returns where it went, if anywhere.
    async fn set_aside(&self) -> Result<Option<PathBuf>, StorageError> {
        Ok(None)
    }
}

/// Discards every save. Used when no snapshot path is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSnapshotStore;

#[async_trait]
impl SnapshotStore for NoopSnapshotStore {
    async fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        Ok(None)
    }

    async fn save(&self, _snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Flat JSON file, overwritten wholesale on each save.
///
/// Writes go to a sibling `.tmp` file first and are renamed over the target,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Where [`SnapshotStore::set_aside`] moves an unreadable file.
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "sessions.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> Result<Option<SessionSnapshot>, StorageError> {
        let body = match tokio::fs::read(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let snapshot: SessionSnapshot = serde_json::from_slice(&body)?;
        info!(
            path = %self.path.display(),
            sessions = snapshot.sessions.len(),
            "session snapshot loaded"
        );
        Ok(Some(snapshot))
    }

    async fn save(&self, snapshot: &SessionSnapshot) -> Result<(), StorageError> {
        let body = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| self.io_error(e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        Ok(())
    }

    async fn set_aside(&self) -> Result<Option<PathBuf>, StorageError> {
        let target = self.corrupt_path();
        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => Ok(Some(target)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

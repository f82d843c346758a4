//! File-backed session registry
//!
//! The registry is a single JSON object mapping identities to sessions.
//! Every update reads the whole registry, applies one change and rewrites
//! the file from the start, so entries of other identities survive.
//!
//! There is no locking: one writer at a time is assumed. Two processes
//! updating the same file concurrently can lose each other's writes.

use std::collections::BTreeMap;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::RwLock;

use super::types::Session;
use crate::security::Sanitizer;

/// Identity → session mapping as persisted on disk
pub type SessionRegistry = BTreeMap<String, Session>;

/// Errors that can occur while reading or writing the registry
#[derive(Debug, Error)]
pub enum SessionStoreError {
    /// Filesystem operation failed
    #[error("{op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// Registry file exists but does not hold a valid registry
    #[error("decode json: {0}")]
    Decode(#[source] serde_json::Error),

    /// Registry could not be serialized
    #[error("encode json: {0}")]
    Encode(#[source] serde_json::Error),
}

impl SessionStoreError {
    fn io(op: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { op, source }
    }
}

/// Durable storage for sessions, keyed by identity
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Returns the stored session for `identity`, or `None` when there is none
    ///
    /// A missing entry is never an error.
    async fn load_session(&self, identity: &str) -> Result<Option<Session>, SessionStoreError>;

    /// Stores `session` for `identity`, or removes the entry when `None`
    ///
    /// Entries of other identities are left untouched.
    async fn update_session(
        &self,
        identity: &str,
        session: Option<&Session>,
    ) -> Result<(), SessionStoreError>;
}

/// Session registry kept in a pretty-printed JSON file
///
/// # Example
///
/// ```no_run
/// use tbank_session::session::{JsonSessionStorage, Session, SessionStorage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = JsonSessionStorage::new("/var/lib/tbank/sessions.json");
/// let session = Session::new(serde_json::json!({"sessionId": "abc"}));
///
/// storage.update_session("+79991234567", Some(&session)).await?;
/// assert_eq!(storage.load_session("+79991234567").await?, Some(session));
///
/// storage.update_session("+79991234567", None).await?;
/// assert_eq!(storage.load_session("+79991234567").await?, None);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JsonSessionStorage {
    path: PathBuf,
}

impl JsonSessionStorage {
    /// Creates a storage backed by the file at `path`
    ///
    /// Neither the file nor its parent directory need to exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns every stored session
    pub async fn sessions(&self) -> Result<SessionRegistry, SessionStoreError> {
        match self.open(OpenOptions::new().read(true)).await {
            Ok(mut file) => read_registry(&mut file).await,
            Err(SessionStoreError::Io { ref source, .. }) if source.kind() == ErrorKind::NotFound => {
                Ok(SessionRegistry::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn open(&self, options: &OpenOptions) -> Result<File, SessionStoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(SessionStoreError::io("create parent directory"))?;
        }

        options
            .open(&self.path)
            .await
            .map_err(SessionStoreError::io("open file"))
    }
}

#[async_trait]
impl SessionStorage for JsonSessionStorage {
    async fn load_session(&self, identity: &str) -> Result<Option<Session>, SessionStoreError> {
        let mut registry = self.sessions().await?;
        let session = registry.remove(identity);

        tracing::debug!(
            "Session for {} {}",
            Sanitizer::mask_phone(identity),
            if session.is_some() { "found" } else { "not found" }
        );

        Ok(session)
    }

    async fn update_session(
        &self,
        identity: &str,
        session: Option<&Session>,
    ) -> Result<(), SessionStoreError> {
        let mut file = self
            .open(OpenOptions::new().read(true).write(true).create(true))
            .await?;

        let size = file
            .metadata()
            .await
            .map_err(SessionStoreError::io("stat"))?
            .len();

        let mut registry = if size > 0 {
            read_registry(&mut file).await?
        } else {
            SessionRegistry::new()
        };

        match session {
            Some(session) => {
                registry.insert(identity.to_string(), session.clone());
            }
            None => {
                registry.remove(identity);
            }
        }

        let mut data = serde_json::to_vec_pretty(&registry).map_err(SessionStoreError::Encode)?;
        data.push(b'\n');

        file.set_len(0)
            .await
            .map_err(SessionStoreError::io("truncate file"))?;
        file.seek(SeekFrom::Start(0))
            .await
            .map_err(SessionStoreError::io("seek to the start of file"))?;
        file.write_all(&data)
            .await
            .map_err(SessionStoreError::io("write file"))?;
        file.flush()
            .await
            .map_err(SessionStoreError::io("flush file"))?;

        tracing::info!(
            "{} session for {} ({} stored)",
            if session.is_some() { "Saved" } else { "Removed" },
            Sanitizer::mask_phone(identity),
            registry.len()
        );

        Ok(())
    }
}

async fn read_registry(file: &mut File) -> Result<SessionRegistry, SessionStoreError> {
    let mut data = Vec::new();
    file.read_to_end(&mut data)
        .await
        .map_err(SessionStoreError::io("read file"))?;

    if data.is_empty() {
        return Ok(SessionRegistry::new());
    }

    serde_json::from_slice(&data).map_err(SessionStoreError::Decode)
}

/// In-process registry with the same semantics as [`JsonSessionStorage`]
///
/// Nothing survives the process; meant for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    registry: RwLock<SessionRegistry>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every stored session
    pub async fn sessions(&self) -> SessionRegistry {
        self.registry.read().await.clone()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load_session(&self, identity: &str) -> Result<Option<Session>, SessionStoreError> {
        Ok(self.registry.read().await.get(identity).cloned())
    }

    async fn update_session(
        &self,
        identity: &str,
        session: Option<&Session>,
    ) -> Result<(), SessionStoreError> {
        let mut registry = self.registry.write().await;
        match session {
            Some(session) => {
                registry.insert(identity.to_string(), session.clone());
            }
            None => {
                registry.remove(identity);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn session(id: &str) -> Session {
        Session::new(json!({ "sessionId": id }))
    }

    fn temp_storage() -> (TempDir, JsonSessionStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonSessionStorage::new(dir.path().join("sessions.json"));
        (dir, storage)
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let (_dir, storage) = temp_storage();
        assert!(!storage.path().exists());
        assert_eq!(storage.load_session("+79990000001").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_empty_file_is_empty() {
        let (_dir, storage) = temp_storage();
        std::fs::write(storage.path(), "").unwrap();
        assert_eq!(storage.load_session("+79990000001").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_decode_error() {
        let (_dir, storage) = temp_storage();
        std::fs::write(storage.path(), "{\"+79990000001\": ").unwrap();

        let err = storage.load_session("+79990000001").await.unwrap_err();
        assert!(matches!(err, SessionStoreError::Decode(_)), "{err}");
    }

    #[tokio::test]
    async fn test_update_malformed_file_keeps_content() {
        let (_dir, storage) = temp_storage();
        std::fs::write(storage.path(), "not json").unwrap();

        let err = storage
            .update_session("+79990000001", Some(&session("a")))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionStoreError::Decode(_)));
        assert_eq!(std::fs::read_to_string(storage.path()).unwrap(), "not json");
    }

    #[tokio::test]
    async fn test_update_then_load() {
        let (_dir, storage) = temp_storage();
        storage
            .update_session("+79990000001", Some(&session("first")))
            .await
            .unwrap();

        assert_eq!(
            storage.load_session("+79990000001").await.unwrap(),
            Some(session("first"))
        );
        assert_eq!(storage.load_session("+79990000002").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_write_wins_per_identity() {
        let (_dir, storage) = temp_storage();
        let writes = [
            ("+79990000001", "a1"),
            ("+79990000002", "b1"),
            ("+79990000001", "a2"),
            ("+79990000003", "c1"),
            ("+79990000002", "b2"),
        ];

        for (identity, id) in writes {
            storage
                .update_session(identity, Some(&session(id)))
                .await
                .unwrap();
        }

        assert_eq!(
            storage.load_session("+79990000001").await.unwrap(),
            Some(session("a2"))
        );
        assert_eq!(
            storage.load_session("+79990000002").await.unwrap(),
            Some(session("b2"))
        );
        assert_eq!(
            storage.load_session("+79990000003").await.unwrap(),
            Some(session("c1"))
        );
    }

    #[tokio::test]
    async fn test_remove_keeps_other_identities() {
        let (_dir, storage) = temp_storage();
        storage
            .update_session("+79990000001", Some(&session("a")))
            .await
            .unwrap();
        storage
            .update_session("+79990000002", Some(&session("b")))
            .await
            .unwrap();

        storage.update_session("+79990000001", None).await.unwrap();

        assert_eq!(storage.load_session("+79990000001").await.unwrap(), None);
        assert_eq!(
            storage.load_session("+79990000002").await.unwrap(),
            Some(session("b"))
        );
    }

    #[tokio::test]
    async fn test_remove_missing_identity_is_noop() {
        let (_dir, storage) = temp_storage();
        storage.update_session("+79990000001", None).await.unwrap();
        assert!(storage.sessions().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shrinking_rewrite_leaves_no_trailing_bytes() {
        let (_dir, storage) = temp_storage();
        let long = Session::new(json!({ "sessionId": "x".repeat(4096) }));
        storage
            .update_session("+79990000001", Some(&long))
            .await
            .unwrap();
        storage
            .update_session("+79990000002", Some(&session("b")))
            .await
            .unwrap();

        storage.update_session("+79990000001", None).await.unwrap();

        let content = std::fs::read_to_string(storage.path()).unwrap();
        let registry: SessionRegistry = serde_json::from_str(&content).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(!content.contains("xxxx"));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonSessionStorage::new(dir.path().join("nested/deeper/sessions.json"));

        storage
            .update_session("+79990000001", Some(&session("a")))
            .await
            .unwrap();

        assert!(storage.path().exists());
    }

    #[tokio::test]
    async fn test_file_is_human_readable_object() {
        let (_dir, storage) = temp_storage();
        storage
            .update_session("+79990000001", Some(&session("a")))
            .await
            .unwrap();

        let content = std::fs::read_to_string(storage.path()).unwrap();
        assert!(content.ends_with('\n'));
        assert!(content.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, json!({ "+79990000001": { "sessionId": "a" } }));
    }

    #[tokio::test]
    async fn test_state_survives_new_instance() {
        let (_dir, storage) = temp_storage();
        storage
            .update_session("+79990000001", Some(&session("a")))
            .await
            .unwrap();

        let reopened = JsonSessionStorage::new(storage.path());
        assert_eq!(
            reopened.load_session("+79990000001").await.unwrap(),
            Some(session("a"))
        );
    }

    #[tokio::test]
    async fn test_memory_storage_semantics() {
        let storage = MemorySessionStorage::new();
        storage
            .update_session("+79990000001", Some(&session("a")))
            .await
            .unwrap();
        storage
            .update_session("+79990000002", Some(&session("b")))
            .await
            .unwrap();
        storage.update_session("+79990000001", None).await.unwrap();

        assert_eq!(storage.load_session("+79990000001").await.unwrap(), None);
        assert_eq!(
            storage.load_session("+79990000002").await.unwrap(),
            Some(session("b"))
        );
        assert_eq!(storage.sessions().await.len(), 1);
    }
}

//! File Record Store
//!
//! One JSON file per record at `<base_dir>/<collection>/<id>.json`.
//! Writes are staged in a sibling file and moved into place, so a reader
//! sees either the previous record or the new one.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::RecordStoreError;
use crate::store::RecordStore;

/// Filesystem-backed record store.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    base_dir: PathBuf,
}

impl FileRecordStore {
    /// Create store rooted at `base_dir`. Directories are created on demand.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root directory of the store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn collection_dir(&self, collection: &str) -> Result<PathBuf, RecordStoreError> {
        check_segment(collection)?;
        Ok(self.base_dir.join(collection))
    }

    fn record_path(&self, collection: &str, id: &str) -> Result<PathBuf, RecordStoreError> {
        check_segment(id)?;
        Ok(self.collection_dir(collection)?.join(format!("{}.json", id)))
    }
}

/// Keys become path segments, so anything that could escape the collection
/// directory is refused.
fn check_segment(segment: &str) -> Result<(), RecordStoreError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment
            .chars()
            .any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control());

    if invalid {
        return Err(RecordStoreError::InvalidKey {
            key: segment.to_string(),
        });
    }
    Ok(())
}

fn serialize(record: &Value) -> Result<Vec<u8>, RecordStoreError> {
    serde_json::to_vec(record).map_err(|e| RecordStoreError::Serialization {
        message: e.to_string(),
    })
}

fn map_io(error: std::io::Error, collection: &str, id: &str) -> RecordStoreError {
    match error.kind() {
        ErrorKind::NotFound => RecordStoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        },
        ErrorKind::AlreadyExists => RecordStoreError::AlreadyExists {
            collection: collection.to_string(),
            id: id.to_string(),
        },
        _ => RecordStoreError::Io(error),
    }
}

/// Write `bytes` to a uniquely named sibling of `path` and return its path.
///
/// Readers only ever see complete records once the staged file is moved
/// into place.
async fn write_staged(path: &Path, bytes: &[u8]) -> Result<PathBuf, RecordStoreError> {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();

    let mut staged = path.as_os_str().to_owned();
    staged.push(format!(".tmp-{}", suffix));
    let staged = PathBuf::from(staged);

    let written = async {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&staged)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&staged).await;
        return Err(RecordStoreError::Io(e));
    }
    Ok(staged)
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn create(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> Result<(), RecordStoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = serialize(&record)?;

        fs::create_dir_all(self.collection_dir(collection)?).await?;

        let staged = write_staged(&path, &bytes).await?;
        // hard_link fails if the target exists, keeping create exclusive.
        let linked = fs::hard_link(&staged, &path).await;
        let _ = fs::remove_file(&staged).await;

        linked.map_err(|e| map_io(e, collection, id))
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Value, RecordStoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = fs::read(&path)
            .await
            .map_err(|e| map_io(e, collection, id))?;

        serde_json::from_slice(&bytes).map_err(|e| RecordStoreError::Serialization {
            message: e.to_string(),
        })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> Result<(), RecordStoreError> {
        let path = self.record_path(collection, id)?;
        let bytes = serialize(&record)?;

        // Updating a missing record is an error, never an implicit create.
        fs::metadata(&path)
            .await
            .map_err(|e| map_io(e, collection, id))?;

        let staged = write_staged(&path, &bytes).await?;
        if let Err(e) = fs::rename(&staged, &path).await {
            let _ = fs::remove_file(&staged).await;
            return Err(map_io(e, collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordStoreError> {
        let path = self.record_path(collection, id)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| map_io(e, collection, id))
    }
}

/// Create file record store rooted at `base_dir`.
pub fn create_file_record_store(base_dir: impl Into<PathBuf>) -> FileRecordStore {
    FileRecordStore::new(base_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        store
            .create("tokens", "abc", json!({"id": "abc", "expires": 5}))
            .await
            .unwrap();

        assert!(dir.path().join("tokens").join("abc.json").exists());
        let record = store.read("tokens", "abc").await.unwrap();
        assert_eq!(record["expires"], 5);
    }

    #[tokio::test]
    async fn test_file_store_create_is_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        store.create("tokens", "abc", json!(1)).await.unwrap();
        let result = store.create("tokens", "abc", json!(2)).await;

        assert!(matches!(result, Err(RecordStoreError::AlreadyExists { .. })));
        assert_eq!(store.read("tokens", "abc").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_file_store_update_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        store
            .create("tokens", "abc", json!({"padding": "x".repeat(64)}))
            .await
            .unwrap();
        store.update("tokens", "abc", json!({"a": 1})).await.unwrap();

        assert_eq!(store.read("tokens", "abc").await.unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_file_store_missing_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        assert!(store.read("tokens", "nope").await.unwrap_err().is_not_found());
        assert!(store
            .update("tokens", "nope", json!(1))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.delete("tokens", "nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_file_store_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        store.create("tokens", "abc", json!(1)).await.unwrap();
        store.delete("tokens", "abc").await.unwrap();

        assert!(!dir.path().join("tokens").join("abc.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        for bad in ["..", "../escape", "a/b", "a\\b", ""] {
            let result = store.read("users", bad).await;
            assert!(
                matches!(result, Err(RecordStoreError::InvalidKey { .. })),
                "key {:?} should be rejected",
                bad
            );
        }
        assert!(store.create("../users", "ok", json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_update_never_creates() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("tokens")).unwrap();

        let result = store.update("tokens", "ghost", json!({"a": 1})).await;

        assert!(matches!(result, Err(RecordStoreError::NotFound { .. })));
        assert!(!dir.path().join("tokens").join("ghost.json").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("tokens")).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_file_store_leaves_no_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        store.create("tokens", "abc", json!(1)).await.unwrap();
        store.update("tokens", "abc", json!(2)).await.unwrap();
        let _ = store.create("tokens", "abc", json!(3)).await;

        let names: Vec<String> = std::fs::read_dir(dir.path().join("tokens"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["abc.json".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_file_store_readers_never_see_partial_updates() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FileRecordStore::new(dir.path()));
        let padding = "x".repeat(4096);

        store
            .create("tokens", "abc", json!({"n": 0, "padding": padding}))
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for writer in 0..2u64 {
            let store = store.clone();
            let padding = padding.clone();
            tasks.push(tokio::spawn(async move {
                for n in 0..200u64 {
                    let record = json!({"n": writer * 1000 + n, "padding": padding});
                    store.update("tokens", "abc", record).await.unwrap();
                }
            }));
        }
        for _ in 0..2 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let record = store.read("tokens", "abc").await.unwrap();
                    assert_eq!(record["padding"].as_str().map(str::len), Some(4096));
                }
            }));
        }

        for task in tasks {
            task.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_file_store_corrupted_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileRecordStore::new(dir.path());

        std::fs::create_dir_all(dir.path().join("tokens")).unwrap();
        std::fs::write(dir.path().join("tokens").join("bad.json"), b"{not json").unwrap();

        let result = store.read("tokens", "bad").await;
        assert!(matches!(result, Err(RecordStoreError::Serialization { .. })));
    }
}

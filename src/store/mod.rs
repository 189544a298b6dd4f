//! Record Storage
//!
//! Namespaced key-value persistence for token and account records.

pub mod file;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::error::RecordStoreError;

pub use file::{create_file_record_store, FileRecordStore};

/// Record store interface.
///
/// Each call is self-contained; no call holds state across another.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a record. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, collection: &str, id: &str, record: Value)
        -> Result<(), RecordStoreError>;

    /// Read a record. Fails with `NotFound` if absent.
    async fn read(&self, collection: &str, id: &str) -> Result<Value, RecordStoreError>;

    /// Replace an existing record. Fails with `NotFound` if absent.
    async fn update(&self, collection: &str, id: &str, record: Value)
        -> Result<(), RecordStoreError>;

    /// Delete a record. Fails with `NotFound` if absent.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordStoreError>;
}

type RecordKey = (String, String);

fn key(collection: &str, id: &str) -> RecordKey {
    (collection.to_string(), id.to_string())
}

fn not_found(collection: &str, id: &str) -> RecordStoreError {
    RecordStoreError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

fn already_exists(collection: &str, id: &str) -> RecordStoreError {
    RecordStoreError::AlreadyExists {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

/// In-memory record store implementation.
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<RecordKey, Value>>,
}

impl InMemoryRecordStore {
    /// Create new in-memory record store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of records in a collection.
    pub fn record_count(&self, collection: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> Result<(), RecordStoreError> {
        let mut records = self.records.lock().unwrap();
        let k = key(collection, id);
        if records.contains_key(&k) {
            return Err(already_exists(collection, id));
        }
        records.insert(k, record);
        Ok(())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Value, RecordStoreError> {
        self.records
            .lock()
            .unwrap()
            .get(&key(collection, id))
            .cloned()
            .ok_or_else(|| not_found(collection, id))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> Result<(), RecordStoreError> {
        let mut records = self.records.lock().unwrap();
        match records.get_mut(&key(collection, id)) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordStoreError> {
        self.records
            .lock()
            .unwrap()
            .remove(&key(collection, id))
            .map(|_| ())
            .ok_or_else(|| not_found(collection, id))
    }
}

/// Record store operation, used for mock history and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Create,
    Read,
    Update,
    Delete,
}

/// A call recorded by [`MockRecordStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreCall {
    pub operation: StoreOperation,
    pub collection: String,
    pub id: String,
}

/// Mock record store for testing.
#[derive(Default)]
pub struct MockRecordStore {
    records: Mutex<HashMap<RecordKey, Value>>,
    history: Mutex<Vec<StoreCall>>,
    failing: Mutex<HashSet<StoreOperation>>,
    should_fail: Mutex<bool>,
}

impl MockRecordStore {
    /// Create new mock record store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set storage to fail all operations.
    pub fn set_should_fail(&self, should_fail: bool) -> &Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    /// Make one kind of operation fail with an I/O error.
    pub fn fail_on(&self, operation: StoreOperation) -> &Self {
        self.failing.lock().unwrap().insert(operation);
        self
    }

    /// Pre-populate a record.
    pub fn add_record(&self, collection: &str, id: &str, record: Value) -> &Self {
        self.records
            .lock()
            .unwrap()
            .insert(key(collection, id), record);
        self
    }

    /// Get a record without recording a call.
    pub fn get_record(&self, collection: &str, id: &str) -> Option<Value> {
        self.records
            .lock()
            .unwrap()
            .get(&key(collection, id))
            .cloned()
    }

    /// Number of records in a collection.
    pub fn record_count(&self, collection: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == collection)
            .count()
    }

    /// Get call history.
    pub fn get_history(&self) -> Vec<StoreCall> {
        self.history.lock().unwrap().clone()
    }

    /// Get calls of one kind.
    pub fn get_calls(&self, operation: StoreOperation) -> Vec<StoreCall> {
        self.history
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.operation == operation)
            .cloned()
            .collect()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.history.lock().unwrap().len()
    }

    fn record_call(
        &self,
        operation: StoreOperation,
        collection: &str,
        id: &str,
    ) -> Result<(), RecordStoreError> {
        self.history.lock().unwrap().push(StoreCall {
            operation,
            collection: collection.to_string(),
            id: id.to_string(),
        });

        if *self.should_fail.lock().unwrap() || self.failing.lock().unwrap().contains(&operation)
        {
            return Err(RecordStoreError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Mock storage failure on {:?}", operation),
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn create(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> Result<(), RecordStoreError> {
        self.record_call(StoreOperation::Create, collection, id)?;

        let mut records = self.records.lock().unwrap();
        let k = key(collection, id);
        if records.contains_key(&k) {
            return Err(already_exists(collection, id));
        }
        records.insert(k, record);
        Ok(())
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Value, RecordStoreError> {
        self.record_call(StoreOperation::Read, collection, id)?;
        self.get_record(collection, id)
            .ok_or_else(|| not_found(collection, id))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        record: Value,
    ) -> Result<(), RecordStoreError> {
        self.record_call(StoreOperation::Update, collection, id)?;

        let mut records = self.records.lock().unwrap();
        match records.get_mut(&key(collection, id)) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), RecordStoreError> {
        self.record_call(StoreOperation::Delete, collection, id)?;
        self.records
            .lock()
            .unwrap()
            .remove(&key(collection, id))
            .map(|_| ())
            .ok_or_else(|| not_found(collection, id))
    }
}

/// Create in-memory record store.
pub fn create_in_memory_record_store() -> InMemoryRecordStore {
    InMemoryRecordStore::new()
}

/// Create mock record store for testing.
pub fn create_mock_record_store() -> MockRecordStore {
    MockRecordStore::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_in_memory_create_and_read() {
        let store = InMemoryRecordStore::new();
        store
            .create("tokens", "abc", json!({"id": "abc"}))
            .await
            .unwrap();

        let record = store.read("tokens", "abc").await.unwrap();
        assert_eq!(record["id"], "abc");
        assert_eq!(store.record_count("tokens"), 1);
        assert_eq!(store.record_count("users"), 0);
    }

    #[tokio::test]
    async fn test_in_memory_collections_are_separate() {
        let store = InMemoryRecordStore::new();
        store.create("tokens", "k", json!(1)).await.unwrap();

        assert!(store.read("users", "k").await.unwrap_err().is_not_found());
        store.create("users", "k", json!(2)).await.unwrap();
        assert_eq!(store.read("users", "k").await.unwrap(), json!(2));
    }

    #[tokio::test]
    async fn test_in_memory_create_rejects_duplicate() {
        let store = InMemoryRecordStore::new();
        store.create("tokens", "abc", json!(1)).await.unwrap();

        let result = store.create("tokens", "abc", json!(2)).await;
        assert!(matches!(result, Err(RecordStoreError::AlreadyExists { .. })));
        assert_eq!(store.read("tokens", "abc").await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_in_memory_update_and_delete_require_existing() {
        let store = InMemoryRecordStore::new();

        assert!(store
            .update("tokens", "missing", json!(1))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store
            .delete("tokens", "missing")
            .await
            .unwrap_err()
            .is_not_found());

        store.create("tokens", "abc", json!(1)).await.unwrap();
        store.update("tokens", "abc", json!(2)).await.unwrap();
        assert_eq!(store.read("tokens", "abc").await.unwrap(), json!(2));

        store.delete("tokens", "abc").await.unwrap();
        assert!(store.read("tokens", "abc").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_store_history() {
        let store = MockRecordStore::new();
        store.add_record("users", "5551234567", json!({"phone": "5551234567"}));

        store.read("users", "5551234567").await.unwrap();
        store.create("tokens", "t1", json!({})).await.unwrap();

        let history = store.get_history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].operation, StoreOperation::Read);
        assert_eq!(history[1].collection, "tokens");
        assert_eq!(store.get_calls(StoreOperation::Create).len(), 1);
    }

    #[tokio::test]
    async fn test_mock_store_failure_injection() {
        let store = MockRecordStore::new();
        store.fail_on(StoreOperation::Update);
        store.add_record("tokens", "t1", json!({}));

        assert!(store.read("tokens", "t1").await.is_ok());
        let result = store.update("tokens", "t1", json!({"changed": true})).await;
        assert!(matches!(result, Err(RecordStoreError::Io(_))));
        assert_eq!(store.get_record("tokens", "t1"), Some(json!({})));

        store.set_should_fail(true);
        assert!(store.read("tokens", "t1").await.is_err());
    }
}

//! Key/value storage backend trait and error types

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Storage error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::Connection(e.to_string())
            }
            other => StorageError::Query(other.to_string()),
        }
    }
}

/// JSON document storage keyed by string (object safe)
#[async_trait]
pub trait StorageBackend: Send + Sync + Debug {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Check if backend is healthy
    async fn is_healthy(&self) -> bool;

    /// Store a JSON value under a key, replacing any previous value
    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError>;

    /// Get a JSON value by key
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Delete a value by key; true if something was removed
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;

    /// List all keys with prefix, in key order
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Typed access on top of any [`StorageBackend`]
#[async_trait]
pub trait StorageExt {
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError>;
    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>;
}

#[async_trait]
impl<S: StorageBackend + ?Sized> StorageExt for S {
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.set_value(key, serde_json::to_value(value)?).await
    }

    async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_value(key).await? {
            Some(json) => Ok(Some(serde_json::from_value(json)?)),
            None => Ok(None),
        }
    }
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: tokio::sync::RwLock<BTreeMap<String, serde_json::Value>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        self.data.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        Ok(self.data.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.data.write().await.remove(key).is_some())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read().await;
        Ok(data
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Doc {
        name: String,
        value: i32,
    }

    #[tokio::test]
    async fn test_memory_backend() {
        let backend = MemoryBackend::new();
        let doc = Doc {
            name: "alice".to_string(),
            value: 42,
        };

        backend.set("profile:1", &doc).await.unwrap();
        backend.set("profile:2", &doc).await.unwrap();
        backend.set("other:1", &doc).await.unwrap();

        let loaded: Option<Doc> = backend.get("profile:1").await.unwrap();
        assert_eq!(loaded, Some(doc));
        assert_eq!(
            backend.list_keys("profile:").await.unwrap(),
            vec!["profile:1", "profile:2"]
        );

        assert!(backend.delete("profile:1").await.unwrap());
        assert!(!backend.delete("profile:1").await.unwrap());
        assert!(backend.get::<Doc>("profile:1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_type_mismatch_is_serialization_error() {
        let backend = MemoryBackend::new();
        backend.set("k", &"just a string").await.unwrap();
        let err = backend.get::<Doc>("k").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}

//! User profile storage

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::backend::{StorageBackend, StorageError, StorageExt};

/// What we know about a registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub username: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

/// Profile store keyed by user id
#[derive(Debug)]
pub struct ProfileStore<B: StorageBackend + ?Sized> {
    backend: Arc<B>,
    prefix: String,
}

impl<B: StorageBackend + ?Sized> Clone for ProfileStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

impl<B: StorageBackend + ?Sized> ProfileStore<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            prefix: "profile:".to_string(),
        }
    }

    fn key(&self, user_id: &str) -> String {
        format!("{}{}", self.prefix, user_id)
    }

    /// Create or refresh a profile.
    ///
    /// A `None` username keeps whatever name was stored before.
    pub async fn upsert(
        &self,
        user_id: &str,
        username: Option<&str>,
    ) -> Result<UserProfile, StorageError> {
        let now = Utc::now();
        let profile = match self.get(user_id).await? {
            Some(mut existing) => {
                if let Some(name) = username {
                    existing.username = Some(name.to_string());
                }
                existing.last_seen = now;
                existing
            }
            None => UserProfile {
                user_id: user_id.to_string(),
                username: username.map(str::to_string),
                created_at: now,
                last_seen: now,
            },
        };
        self.backend.set(&self.key(user_id), &profile).await?;
        Ok(profile)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StorageError> {
        self.backend.get(&self.key(user_id)).await
    }

    /// Display name for a user, if one was ever supplied
    pub async fn username_of(&self, user_id: &str) -> Result<Option<String>, StorageError> {
        Ok(self.get(user_id).await?.and_then(|p| p.username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    #[tokio::test]
    async fn test_upsert_keeps_existing_username() {
        let store = ProfileStore::new(Arc::new(MemoryBackend::new()));

        let created = store.upsert("u1", Some("ada")).await.unwrap();
        assert_eq!(created.username.as_deref(), Some("ada"));

        let refreshed = store.upsert("u1", None).await.unwrap();
        assert_eq!(refreshed.username.as_deref(), Some("ada"));
        assert_eq!(refreshed.created_at, created.created_at);

        store.upsert("u1", Some("lovelace")).await.unwrap();
        assert_eq!(
            store.username_of("u1").await.unwrap().as_deref(),
            Some("lovelace")
        );
    }

    #[tokio::test]
    async fn test_unknown_user_has_no_name() {
        let store = ProfileStore::new(Arc::new(MemoryBackend::new()));
        assert!(store.username_of("nobody").await.unwrap().is_none());
    }
}

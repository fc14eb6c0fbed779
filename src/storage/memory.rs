//! In-memory session storage
//!
//! A HashMap behind an async RwLock. Thread-safe, and the right choice for
//! development, tests, and single-instance deployments; state does not
//! survive a restart.

use crate::error::StorageError;
use crate::session::Session;
use crate::storage::SessionStore;
use crate::types::ConversationId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory session storage implementation
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<ConversationId, Session>>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory session store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently stored
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Clear all sessions from the store
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, session: Session) -> Result<ConversationId, StorageError> {
        let id = session.conversation_id.clone();
        let mut sessions = self.sessions.write().await;

        if sessions.contains_key(&id) {
            return Err(StorageError::AlreadyExists(format!(
                "Session for conversation {} already exists",
                id
            )));
        }

        sessions.insert(id.clone(), session);
        Ok(id)
    }

    async fn get(&self, id: &ConversationId) -> Result<Option<Session>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(id).cloned())
    }

    async fn update(&self, id: &ConversationId, session: Session) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;

        if !sessions.contains_key(id) {
            return Err(StorageError::NotFound(format!(
                "Session for conversation {} not found",
                id
            )));
        }

        sessions.insert(id.clone(), session);
        Ok(())
    }

    async fn delete(&self, id: &ConversationId) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;

        if sessions.remove(id).is_none() {
            return Err(StorageError::NotFound(format!(
                "Session for conversation {} not found",
                id
            )));
        }

        Ok(())
    }

    async fn list(&self) -> Result<Vec<ConversationId>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.keys().cloned().collect())
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.contains_key(id))
    }
}

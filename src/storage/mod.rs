//! Session storage backends
//!
//! Trait-based abstraction over where per-conversation state lives. The
//! in-memory backend is the default; the trait keeps the door open for a
//! shared store when the bot runs behind more than one instance.

use crate::error::StorageError;
use crate::session::Session;
use crate::types::ConversationId;
use async_trait::async_trait;

pub mod memory;

/// Trait for session storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create a new session in the store.
    ///
    /// Fails with [`StorageError::AlreadyExists`] if the conversation
    /// already has a session.
    async fn create(&self, session: Session) -> Result<ConversationId, StorageError>;

    /// Get a session by conversation ID, None if not found.
    async fn get(&self, id: &ConversationId) -> Result<Option<Session>, StorageError>;

    /// Update an existing session.
    async fn update(&self, id: &ConversationId, session: Session) -> Result<(), StorageError>;

    /// Delete a session by conversation ID.
    async fn delete(&self, id: &ConversationId) -> Result<(), StorageError>;

    /// List all conversation IDs with a session.
    async fn list(&self) -> Result<Vec<ConversationId>, StorageError>;

    /// Check if a session exists.
    async fn exists(&self, id: &ConversationId) -> Result<bool, StorageError> {
        Ok(self.get(id).await?.is_some())
    }
}

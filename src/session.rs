//! Per-conversation session state
//!
//! A session carries everything the bot remembers between turns: the message
//! history, the active dialog flow (if any), and the offers from the most
//! recent search so a later "book it" can refer back to them.

use crate::dialog::DialogState;
use crate::flights::FlightOffer;
use crate::types::{ConversationId, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Status of a conversation session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is active and can process turns
    Active,
    /// Session has been ended
    Ended,
}

/// Who authored a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Bot,
}

/// One line of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: MessageId,
    pub role: HistoryRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: HistoryRole::User,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role: HistoryRole::Bot,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

fn default_max_history() -> usize {
    100
}

/// A conversation session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Conversation this session belongs to
    pub conversation_id: ConversationId,
    /// Current status
    pub status: SessionStatus,
    /// Message history, oldest first
    pub history: Vec<HistoryEntry>,
    /// Maximum history entries to keep
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Active dialog flow (None between flows)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialog: Option<DialogState>,
    /// Offers from the most recent search, for later booking
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub offers: Vec<FlightOffer>,
    /// Conversation-scoped key/value properties.
    ///
    /// Extension seam for channel metadata (locale, user profile, feature
    /// flags). The core turn loop neither reads nor writes it; it persists
    /// with the session so storage backends and embedders can rely on it.
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub properties: HashMap<String, serde_json::Value>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the session was last updated
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session for a conversation
    pub fn new(conversation_id: ConversationId) -> Self {
        let now = Utc::now();
        Self {
            conversation_id,
            status: SessionStatus::Active,
            history: Vec::new(),
            max_history: default_max_history(),
            dialog: None,
            offers: Vec::new(),
            properties: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a history entry, trimming the oldest past the limit.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(0..excess);
        }
        self.touch();
    }

    /// Update the session's updated_at timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether a dialog flow is currently waiting on the user
    pub fn dialog_active(&self) -> bool {
        self.dialog.is_some()
    }

    /// Drop any active dialog flow.
    pub fn cancel_dialog(&mut self) {
        self.dialog = None;
        self.touch();
    }

    /// Replace the stored offers from a search.
    pub fn store_offers(&mut self, offers: Vec<FlightOffer>) {
        self.offers = offers;
        self.touch();
    }

    /// End the session.
    pub fn end(&mut self) {
        self.status = SessionStatus::Ended;
        self.touch();
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::FlowKind;

    #[test]
    fn test_session_creation() {
        let session = Session::new(ConversationId::new("conv-1"));
        assert!(session.is_active());
        assert!(session.history.is_empty());
        assert!(!session.dialog_active());
        assert!(session.offers.is_empty());
    }

    #[test]
    fn test_record_trims_history() {
        let mut session = Session::new(ConversationId::new("conv-1"));
        session.max_history = 3;

        for i in 0..5 {
            session.record(HistoryEntry::user(format!("message {}", i)));
        }

        assert_eq!(session.history.len(), 3);
        assert_eq!(session.history[0].content, "message 2");
        assert_eq!(session.history[2].content, "message 4");
    }

    #[test]
    fn test_dialog_lifecycle() {
        let mut session = Session::new(ConversationId::new("conv-1"));
        session.dialog = Some(DialogState::new(FlowKind::FlightSearch));
        assert!(session.dialog_active());

        session.cancel_dialog();
        assert!(!session.dialog_active());
    }

    #[test]
    fn test_session_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }

    #[test]
    fn test_session_serialization_roundtrip() {
        let mut session = Session::new(ConversationId::new("conv-1"));
        session.record(HistoryEntry::user("hello"));
        session.record(HistoryEntry::bot("hi"));
        session
            .properties
            .insert("locale".to_string(), serde_json::json!("en-US"));

        let json = serde_json::to_string(&session).unwrap();
        let deserialized: Session = serde_json::from_str(&json).unwrap();

        assert_eq!(session.conversation_id, deserialized.conversation_id);
        assert_eq!(session.history.len(), deserialized.history.len());
        assert_eq!(session.properties, deserialized.properties);
    }

    #[test]
    fn test_end_session() {
        let mut session = Session::new(ConversationId::new("conv-1"));
        session.end();
        assert!(!session.is_active());
        assert_eq!(session.status, SessionStatus::Ended);
    }
}

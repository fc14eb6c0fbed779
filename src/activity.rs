//! Chat activity model
//!
//! Inbound and outbound payloads for the webhook follow the common
//! bot-channel activity shape: a `type` discriminator, free text, optional
//! card attachments, and an optional `value` object carrying card-submission
//! data. Field names are camelCase on the wire.

use crate::types::{ConversationId, MessageId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Activity type discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    /// A user or bot message
    Message,
    /// Membership change in the conversation
    ConversationUpdate,
    /// Anything we do not handle
    #[serde(other)]
    Other,
}

/// A participant in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Reference to the conversation an activity belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: ConversationId,
}

/// A card attachment on an outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,
    pub content: Value,
}

impl Attachment {
    /// Wrap an adaptive-card JSON body in an attachment.
    pub fn adaptive_card(content: Value) -> Self {
        Self {
            content_type: "application/vnd.microsoft.card.adaptive".to_string(),
            content,
        }
    }
}

/// A single chat activity, inbound or outbound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Card-submission payload, if the user pressed a card action
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub members_added: Vec<ChannelAccount>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Activity {
    /// Outbound plain-text message.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            id: Some(MessageId::new().to_string()),
            text: Some(text.into()),
            value: None,
            from: None,
            recipient: None,
            conversation: None,
            members_added: Vec::new(),
            attachments: Vec::new(),
            timestamp: Some(Utc::now()),
        }
    }

    /// Outbound message carrying a single card attachment.
    pub fn card(attachment: Attachment) -> Self {
        Self {
            activity_type: ActivityType::Message,
            id: Some(MessageId::new().to_string()),
            text: None,
            value: None,
            from: None,
            recipient: None,
            conversation: None,
            members_added: Vec::new(),
            attachments: vec![attachment],
            timestamp: Some(Utc::now()),
        }
    }

    /// User text, trimmed; None for non-text activities.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Conversation this activity belongs to.
    pub fn conversation_id(&self) -> Option<&ConversationId> {
        self.conversation.as_ref().map(|c| &c.id)
    }

    /// Card-submitted intent label, if any.
    pub fn submitted_intent(&self) -> Option<&str> {
        self.value.as_ref()?.get("intent")?.as_str()
    }

    /// Whether a card submission asked for the active dialog to be reset.
    pub fn reset_requested(&self) -> bool {
        self.value
            .as_ref()
            .and_then(|v| v.get("resetDialog"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Card-submitted flight number, if the user selected an offer card.
    pub fn submitted_flight_number(&self) -> Option<&str> {
        self.value.as_ref()?.get("flightNumber")?.as_str()
    }

    /// True when this update added members other than the bot itself.
    pub fn added_someone_besides(&self, recipient_id: &str) -> bool {
        self.members_added.iter().any(|m| m.id != recipient_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inbound(text: &str) -> Activity {
        serde_json::from_value(json!({
            "type": "message",
            "text": text,
            "from": { "id": "user-1", "name": "User" },
            "recipient": { "id": "bot-1" },
            "conversation": { "id": "conv-1" }
        }))
        .unwrap()
    }

    #[test]
    fn test_inbound_message_deserialization() {
        let activity = inbound("book a flight");
        assert_eq!(activity.activity_type, ActivityType::Message);
        assert_eq!(activity.trimmed_text(), Some("book a flight"));
        assert_eq!(
            activity.conversation_id(),
            Some(&ConversationId::new("conv-1"))
        );
    }

    #[test]
    fn test_trimmed_text_filters_whitespace() {
        let activity = inbound("   ");
        assert_eq!(activity.trimmed_text(), None);
    }

    #[test]
    fn test_card_submission_fields() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "message",
            "value": { "intent": "SearchFlights", "resetDialog": true },
            "conversation": { "id": "conv-1" }
        }))
        .unwrap();

        assert_eq!(activity.submitted_intent(), Some("SearchFlights"));
        assert!(activity.reset_requested());
        assert_eq!(activity.submitted_flight_number(), None);
    }

    #[test]
    fn test_unknown_activity_type_maps_to_other() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "typing",
            "conversation": { "id": "conv-1" }
        }))
        .unwrap();
        assert_eq!(activity.activity_type, ActivityType::Other);
    }

    #[test]
    fn test_conversation_update_members() {
        let activity: Activity = serde_json::from_value(json!({
            "type": "conversationUpdate",
            "membersAdded": [{ "id": "user-1" }, { "id": "bot-1" }],
            "recipient": { "id": "bot-1" },
            "conversation": { "id": "conv-1" }
        }))
        .unwrap();

        assert_eq!(activity.activity_type, ActivityType::ConversationUpdate);
        assert!(activity.added_someone_besides("bot-1"));
        assert_eq!(activity.members_added.len(), 2);
    }

    #[test]
    fn test_outbound_message_serialization() {
        let activity = Activity::message("Hello");
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["text"], "Hello");
        // Empty collections stay off the wire
        assert!(json.get("attachments").is_none());
        assert!(json.get("membersAdded").is_none());
    }

    #[test]
    fn test_card_activity_has_attachment() {
        let activity = Activity::card(Attachment::adaptive_card(json!({"type": "AdaptiveCard"})));
        assert_eq!(activity.attachments.len(), 1);
        assert_eq!(
            activity.attachments[0].content_type,
            "application/vnd.microsoft.card.adaptive"
        );
    }
}

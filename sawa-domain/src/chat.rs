use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Chat channel binding a booking, its traveler, and the hosts engaged on
/// it. Created lazily on first host engagement; exactly one per
/// (booking, host) pair that ever exchanged a message or offer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub traveler_id: Uuid,
    pub host_ids: Vec<Uuid>,
    pub last_message_preview: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(booking_id: Uuid, traveler_id: Uuid, host_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_id,
            traveler_id,
            host_ids: vec![host_id],
            last_message_preview: None,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn includes_host(&self, host_id: &Uuid) -> bool {
        self.host_ids.contains(host_id)
    }
}

/// Chat entry owned entirely by its conversation; removed en masse when
/// the conversation is deleted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: Uuid, sender_id: Uuid, body: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation_id,
            sender_id,
            body,
            created_at: Utc::now(),
        }
    }

    /// Short text shown as the conversation's last-message preview
    pub fn preview(&self) -> String {
        const PREVIEW_CHARS: usize = 80;
        self.body.chars().take(PREVIEW_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_includes_host() {
        let host = Uuid::new_v4();
        let convo = Conversation::new(Uuid::new_v4(), Uuid::new_v4(), host);
        assert!(convo.includes_host(&host));
        assert!(!convo.includes_host(&Uuid::new_v4()));
    }

    #[test]
    fn test_message_preview_truncates() {
        let msg = Message::new(Uuid::new_v4(), Uuid::new_v4(), "a".repeat(200));
        assert_eq!(msg.preview().chars().count(), 80);
    }
}

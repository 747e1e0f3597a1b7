//! Database models for inbound messages.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use florin_core::inbox::{InboundMessage, NewInboundMessage};

use crate::schema::inbound_messages;

/// Database model for one inbound conversational message
#[derive(
    Debug, Clone, Queryable, Identifiable, Insertable, AsChangeset, Selectable, Serialize,
    Deserialize,
)]
#[diesel(table_name = inbound_messages)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct InboundMessageDB {
    pub id: String,
    pub conversation_id: String,
    pub sender: String,
    pub body: String,
    pub received_at: String,
    pub claimed_at: Option<String>,
}

impl InboundMessageDB {
    /// Builds a fresh unclaimed row stamped with the arrival time.
    pub fn from_new(new_message: NewInboundMessage) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            conversation_id: new_message.conversation_id,
            sender: new_message.sender,
            body: new_message.body,
            received_at: Utc::now().to_rfc3339(),
            claimed_at: None,
        }
    }
}

impl From<InboundMessageDB> for InboundMessage {
    fn from(db: InboundMessageDB) -> Self {
        Self {
            id: db.id,
            conversation_id: db.conversation_id,
            sender: db.sender,
            body: db.body,
            received_at: DateTime::parse_from_rfc3339(&db.received_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            claimed_at: db.claimed_at.and_then(|s| {
                DateTime::parse_from_rfc3339(&s)
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc))
            }),
        }
    }
}

impl From<InboundMessage> for InboundMessageDB {
    fn from(domain: InboundMessage) -> Self {
        Self {
            id: domain.id,
            conversation_id: domain.conversation_id,
            sender: domain.sender,
            body: domain.body,
            received_at: domain.received_at.to_rfc3339(),
            claimed_at: domain.claimed_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_starts_unclaimed() {
        let row = InboundMessageDB::from_new(NewInboundMessage {
            conversation_id: "conv-1".to_string(),
            sender: "+15550100".to_string(),
            body: "how much did I spend on coffee?".to_string(),
        });

        assert!(!row.id.is_empty());
        assert_eq!(row.conversation_id, "conv-1");
        assert!(row.claimed_at.is_none());
        assert!(DateTime::parse_from_rfc3339(&row.received_at).is_ok());
    }
}

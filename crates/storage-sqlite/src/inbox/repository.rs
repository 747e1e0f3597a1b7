use chrono::{DateTime, Utc};
use diesel::dsl::{count_star, max, min};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sqlite::SqliteConnection;
use log::debug;
use std::sync::Arc;

use florin_core::inbox::{
    ConversationBacklog, InboundMessage, InboxRepositoryTrait, NewInboundMessage,
};
use florin_core::Result;

use super::model::InboundMessageDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::inbound_messages;
use async_trait::async_trait;

/// Repository for the inbound message queue.
pub struct InboxRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl InboxRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl InboxRepositoryTrait for InboxRepository {
    async fn insert(&self, new_message: NewInboundMessage) -> Result<InboundMessage> {
        new_message.validate()?;
        let row = InboundMessageDB::from_new(new_message);

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<InboundMessage> {
                    let inserted = diesel::insert_into(inbound_messages::table)
                        .values(&row)
                        .get_result::<InboundMessageDB>(conn)
                        .map_err(StorageError::from)?;
                    Ok(InboundMessage::from(inserted))
                },
            )
            .await
    }

    /// Stamps and returns every unclaimed row of the conversation in one
    /// UPDATE. Racing callers hit the same WHERE clause, so whichever
    /// statement runs first takes the whole batch and the rest match zero
    /// rows.
    async fn claim_batch(&self, conversation_id: &str) -> Result<Vec<InboundMessage>> {
        let conversation_id_owned = conversation_id.to_string();

        self.writer
            .exec(
                move |conn: &mut SqliteConnection| -> Result<Vec<InboundMessage>> {
                    let claimed_rows: Vec<InboundMessageDB> = diesel::update(
                        inbound_messages::table
                            .filter(inbound_messages::conversation_id.eq(&conversation_id_owned))
                            .filter(inbound_messages::claimed_at.is_null()),
                    )
                    .set(inbound_messages::claimed_at.eq(Utc::now().to_rfc3339()))
                    .get_results::<InboundMessageDB>(conn)
                    .map_err(StorageError::from)?;

                    if !claimed_rows.is_empty() {
                        debug!(
                            "Claimed {} messages for conversation {}",
                            claimed_rows.len(),
                            conversation_id_owned
                        );
                    }

                    // RETURNING order is unspecified; restore arrival order.
                    let mut messages: Vec<InboundMessage> =
                        claimed_rows.into_iter().map(InboundMessage::from).collect();
                    messages.sort_by_key(|m| m.received_at);

                    Ok(messages)
                },
            )
            .await
    }

    fn backlog(&self, conversation_id: &str) -> Result<ConversationBacklog> {
        let mut conn = get_connection(&self.pool)?;

        let (pending, oldest, newest) = inbound_messages::table
            .filter(inbound_messages::conversation_id.eq(conversation_id))
            .filter(inbound_messages::claimed_at.is_null())
            .select((
                count_star(),
                min(inbound_messages::received_at),
                max(inbound_messages::received_at),
            ))
            .first::<(i64, Option<String>, Option<String>)>(&mut conn)
            .map_err(StorageError::from)?;

        let parse = |s: String| {
            DateTime::parse_from_rfc3339(&s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc))
        };

        Ok(ConversationBacklog {
            pending: pending as usize,
            oldest_at: oldest.and_then(parse),
            newest_at: newest.and_then(parse),
        })
    }

    fn conversations_with_unclaimed(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        let conversations = inbound_messages::table
            .filter(inbound_messages::claimed_at.is_null())
            .select(inbound_messages::conversation_id)
            .distinct()
            .order(inbound_messages::conversation_id.asc())
            .load::<String>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(conversations)
    }
}

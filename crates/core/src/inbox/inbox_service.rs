use chrono::Utc;
use log::{debug, warn};
use std::sync::Arc;
use tokio::time::sleep;

use super::inbox_model::{
    BacklogDisposition, DebounceConfig, InboundMessage, NewInboundMessage, FALLBACK_REPLY,
};
use super::inbox_traits::{InboxRepositoryTrait, InboxServiceTrait, Responder};
use crate::Result;

/// Service debouncing inbound messages into single claimed batches
pub struct InboxService {
    repository: Arc<dyn InboxRepositoryTrait>,
    responder: Arc<dyn Responder>,
    config: DebounceConfig,
}

impl InboxService {
    /// Creates a new InboxService instance
    pub fn new(
        repository: Arc<dyn InboxRepositoryTrait>,
        responder: Arc<dyn Responder>,
        config: DebounceConfig,
    ) -> Self {
        Self {
            repository,
            responder,
            config,
        }
    }

    /// Polls until the conversation is claimable or emptied by another worker.
    ///
    /// Returns `false` when there is nothing left to claim. The loop is
    /// bounded: the oldest unclaimed row only gets older, so the wait
    /// ceiling eventually fires no matter how fast messages keep arriving.
    async fn await_quiet(&self, conversation_id: &str) -> Result<bool> {
        loop {
            let backlog = self.repository.backlog(conversation_id)?;
            match backlog.disposition(&self.config, Utc::now()) {
                BacklogDisposition::Empty => return Ok(false),
                BacklogDisposition::Ready => return Ok(true),
                BacklogDisposition::Settling { wait } => {
                    debug!(
                        "Conversation {} still settling ({} pending), next check in {:?}",
                        conversation_id, backlog.pending, wait
                    );
                    sleep(wait).await;
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl InboxServiceTrait for InboxService {
    async fn ingest(&self, new_message: NewInboundMessage) -> Result<InboundMessage> {
        new_message.validate()?;
        let message = self.repository.insert(new_message).await?;
        debug!(
            "Recorded message {} in conversation {}",
            message.id, message.conversation_id
        );
        Ok(message)
    }

    async fn collect_batch(&self, conversation_id: &str) -> Result<Vec<InboundMessage>> {
        if !self.await_quiet(conversation_id).await? {
            return Ok(Vec::new());
        }
        // The claim itself still races; losing here just yields an empty
        // batch, same as finding the conversation already drained.
        self.repository.claim_batch(conversation_id).await
    }

    async fn respond(&self, conversation_id: &str) -> Result<Option<String>> {
        let batch = self.collect_batch(conversation_id).await?;
        if batch.is_empty() {
            return Ok(None);
        }

        debug!(
            "Responding to {} messages in conversation {}",
            batch.len(),
            conversation_id
        );

        match self.responder.generate(&batch).await {
            Ok(reply) => Ok(reply),
            Err(err) => {
                warn!(
                    "Responder failed for conversation {} ({} messages kept claimed): {}",
                    conversation_id,
                    batch.len(),
                    err
                );
                Ok(Some(FALLBACK_REPLY.to_string()))
            }
        }
    }

    fn pending_conversations(&self) -> Result<Vec<String>> {
        self.repository.conversations_with_unclaimed()
    }
}

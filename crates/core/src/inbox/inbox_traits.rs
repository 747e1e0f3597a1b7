//! Inbox repository, responder, and service traits.

use async_trait::async_trait;

use super::inbox_model::{ConversationBacklog, InboundMessage, NewInboundMessage};
use crate::errors::Result;

/// Trait defining the contract for inbound message persistence.
#[async_trait]
pub trait InboxRepositoryTrait: Send + Sync {
    /// Records a newly arrived message.
    async fn insert(&self, new_message: NewInboundMessage) -> Result<InboundMessage>;

    /// Claims every unclaimed message in a conversation, atomically.
    ///
    /// Exactly one of any set of racing callers gets a non-empty batch; the
    /// rest get an empty vec. Rows come back oldest first.
    async fn claim_batch(&self, conversation_id: &str) -> Result<Vec<InboundMessage>>;

    /// Reads the unclaimed snapshot for one conversation.
    fn backlog(&self, conversation_id: &str) -> Result<ConversationBacklog>;

    /// Lists conversations that still have unclaimed messages.
    fn conversations_with_unclaimed(&self) -> Result<Vec<String>>;
}

/// Reply generator sitting behind the batch handoff.
///
/// `Ok(None)` means the batch needs no reply. Implementations see a batch at
/// most once; there is no retry path through this trait.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn generate(&self, messages: &[InboundMessage]) -> Result<Option<String>>;
}

/// Trait defining the contract for inbox operations.
#[async_trait]
pub trait InboxServiceTrait: Send + Sync {
    /// Records an inbound message and returns immediately.
    ///
    /// Ingest never waits on debouncing; the poll loop runs in whichever
    /// worker handles the conversation afterwards.
    async fn ingest(&self, new_message: NewInboundMessage) -> Result<InboundMessage>;

    /// Waits for the conversation to go quiet, then claims its batch.
    ///
    /// Returns an empty vec when another worker claimed first.
    async fn collect_batch(&self, conversation_id: &str) -> Result<Vec<InboundMessage>>;

    /// Collects a batch and produces the reply for it.
    ///
    /// Responder failures yield the fallback reply; the batch stays claimed
    /// regardless.
    async fn respond(&self, conversation_id: &str) -> Result<Option<String>>;

    /// Lists conversations with unclaimed messages, for sweep triggers.
    fn pending_conversations(&self) -> Result<Vec<String>>;
}

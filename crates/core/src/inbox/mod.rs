//! Inbox module - debounced intake and batch claim of inbound messages.

mod inbox_model;
mod inbox_service;
mod inbox_traits;



pub use inbox_model::{
    BacklogDisposition, ConversationBacklog, DebounceConfig, InboundMessage, NewInboundMessage,
    FALLBACK_REPLY,
};
pub use inbox_service::InboxService;
pub use inbox_traits::{InboxRepositoryTrait, InboxServiceTrait, Responder};

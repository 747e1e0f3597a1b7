//! Inbound message domain models and debounce bookkeeping.
//!
//! Messages arrive one row at a time and are only ever mutated once: the
//! claim that stamps `claimed_at`. Everything the debouncer knows about a
//! conversation is derived from its unclaimed rows, so any worker can pick
//! up where a dead one left off.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{errors::ValidationError, Error, Result};

/// Reply sent when the responder fails on an already-claimed batch.
///
/// The batch stays claimed either way; replaying messages into a second
/// generation attempt is how double-replies happen.
pub const FALLBACK_REPLY: &str =
    "Sorry, I hit a snag processing that. Give me a moment and ask again.";

/// Domain model for one inbound conversational message.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    /// Debounce group key; one claimed batch never spans conversations.
    pub conversation_id: String,
    pub sender: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
    /// Set exactly once, by the batch claim that consumed this row.
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Input model for recording a newly arrived message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInboundMessage {
    pub conversation_id: String,
    pub sender: String,
    pub body: String,
}

impl NewInboundMessage {
    pub fn validate(&self) -> Result<()> {
        if self.conversation_id.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "conversationId".to_string(),
            )));
        }
        if self.sender.trim().is_empty() {
            return Err(Error::Validation(ValidationError::MissingField(
                "sender".to_string(),
            )));
        }
        Ok(())
    }
}

/// Debounce timing knobs.
#[derive(Debug, Clone, Copy)]
pub struct DebounceConfig {
    /// A conversation is quiet once this long has passed since its newest
    /// unclaimed message.
    pub quiet_window: Duration,
    /// Hard ceiling: flush once the oldest unclaimed message is this old,
    /// quiet or not.
    pub max_wait: Duration,
    /// Floor for the poll sleep, so near-deadline checks don't spin.
    pub min_poll: Duration,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            quiet_window: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
            min_poll: Duration::from_millis(250),
        }
    }
}

/// Snapshot of a conversation's unclaimed rows, as read in one poll.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConversationBacklog {
    pub pending: usize,
    pub oldest_at: Option<DateTime<Utc>>,
    pub newest_at: Option<DateTime<Utc>>,
}

/// What a poll decided to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BacklogDisposition {
    /// Nothing unclaimed; someone else took the batch (or none existed).
    Empty,
    /// Messages are still landing; check again after `wait`.
    Settling { wait: Duration },
    /// Quiet window elapsed, or the oldest message hit the wait ceiling.
    Ready,
}

impl ConversationBacklog {
    /// Decides whether the conversation is claimable at `now`.
    ///
    /// Ages in the future (clock skew between writers) count as zero.
    pub fn disposition(&self, config: &DebounceConfig, now: DateTime<Utc>) -> BacklogDisposition {
        let (oldest_at, newest_at) = match (self.oldest_at, self.newest_at) {
            (Some(oldest), Some(newest)) if self.pending > 0 => (oldest, newest),
            _ => return BacklogDisposition::Empty,
        };

        let newest_age = (now - newest_at).to_std().unwrap_or_default();
        let oldest_age = (now - oldest_at).to_std().unwrap_or_default();

        if newest_age >= config.quiet_window || oldest_age >= config.max_wait {
            return BacklogDisposition::Ready;
        }

        // Sleep until whichever deadline lands first: the quiet window for
        // the newest row, or the ceiling for the oldest.
        let until_quiet = config.quiet_window - newest_age;
        let until_ceiling = config.max_wait - oldest_age;
        let wait = until_quiet.min(until_ceiling).max(config.min_poll);

        BacklogDisposition::Settling { wait }
    }
}

//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a presentation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use msgcenter_shared::MessageId;

// ---------------------------------------------------------------------------
// MessageState
// ---------------------------------------------------------------------------

/// Durable read/pin status of one conversation, independent of its content.
///
/// `is_read == true` conventionally implies `unread_count == 0`; the store
/// records whatever the caller writes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageState {
    pub message_id: MessageId,
    pub is_read: bool,
    pub unread_count: u32,
    pub is_pinned: bool,
    /// Time of the last write to this row.
    pub updated_at: DateTime<Utc>,
}

impl MessageState {
    /// Values that apply when no row exists for an id.
    pub fn unseen(message_id: MessageId) -> Self {
        Self {
            message_id,
            is_read: false,
            unread_count: 0,
            is_pinned: false,
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Remark
// ---------------------------------------------------------------------------

/// A user-private display-name override for a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Remark {
    pub message_id: MessageId,
    /// Display name captured when the first remark was saved.
    pub nickname: String,
    /// Free text; empty means no remark.
    pub remark: String,
    /// Fixed at first insert.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

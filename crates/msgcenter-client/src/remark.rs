//! Editing flow for a single message's remark.

use msgcenter_shared::{Message, MessageId};
use msgcenter_store::Database;

use crate::error::ClientError;

/// Draft of one message's remark, saved through the remark store.
///
/// After [`save`](Self::save) the caller refreshes the list entry with
/// [`MessageList::update_remark`](crate::list::MessageList::update_remark).
pub struct RemarkEditor {
    db: Database,
    message_id: MessageId,
    nickname: String,
    text: String,
}

impl RemarkEditor {
    /// Start editing. The draft is the saved remark, else the remark
    /// carried by `message`, else empty.
    pub fn open(db: Database, message: &Message) -> Result<Self, ClientError> {
        let text = match db.get_remark(&message.id)? {
            Some(saved) => saved,
            None => message.remark.clone().unwrap_or_default(),
        };

        Ok(Self {
            db,
            message_id: message.id.clone(),
            nickname: message.nickname.clone(),
            text,
        })
    }

    pub fn message_id(&self) -> &MessageId {
        &self.message_id
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Whether the draft differs from `original` (absent counts as empty).
    pub fn has_changes(&self, original: Option<&str>) -> bool {
        self.text != original.unwrap_or_default()
    }

    /// Write the draft through and return the saved text.
    pub fn save(&self) -> Result<String, ClientError> {
        self.db
            .set_remark(&self.message_id, &self.nickname, &self.text)?;
        tracing::info!(message_id = %self.message_id, "remark saved");
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use msgcenter_shared::{MessageContent, MessageType};

    use super::*;

    fn message(remark: Option<&str>) -> Message {
        Message {
            id: MessageId::new("m1"),
            avatar: String::new(),
            nickname: "Alice".into(),
            timestamp: Utc::now(),
            summary: "hi".into(),
            message_type: MessageType::Friend,
            is_read: false,
            unread_count: 0,
            remark: remark.map(str::to_string),
            is_pinned: false,
            content: MessageContent::text("hi"),
        }
    }

    #[test]
    fn draft_prefers_saved_remark() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(RemarkEditor::open(db.clone(), &message(None)).unwrap().text(), "");
        assert_eq!(
            RemarkEditor::open(db.clone(), &message(Some("cached"))).unwrap().text(),
            "cached"
        );

        db.set_remark(&MessageId::new("m1"), "Alice", "saved").unwrap();
        assert_eq!(
            RemarkEditor::open(db, &message(Some("cached"))).unwrap().text(),
            "saved"
        );
    }

    #[test]
    fn has_changes_treats_absent_as_empty() {
        let db = Database::open_in_memory().unwrap();
        let mut editor = RemarkEditor::open(db, &message(None)).unwrap();

        assert!(!editor.has_changes(None));
        editor.set_text("Boss");
        assert!(editor.has_changes(None));
        assert!(!editor.has_changes(Some("Boss")));
    }

    #[test]
    fn save_writes_through_with_nickname_snapshot() {
        let db = Database::open_in_memory().unwrap();
        let mut editor = RemarkEditor::open(db.clone(), &message(None)).unwrap();
        editor.set_text("Boss");

        assert_eq!(editor.save().unwrap(), "Boss");

        let record = db.get_remark_record(&MessageId::new("m1")).unwrap().unwrap();
        assert_eq!(record.nickname, "Alice");
        assert_eq!(record.remark, "Boss");
    }
}

//! Application context shared by every caller of the message center.
//!
//! [`MessageCenter`] is constructed once by the host and handed out behind
//! an `Arc`. It owns the database handle, the analytics ledger and the
//! message list, so there are no process-wide singletons.

use std::sync::Arc;

use msgcenter_shared::{Message, MessageId};
use msgcenter_store::{AnalyticsLedger, Database};
use tokio::sync::mpsc;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::spawn_push_listener;
use crate::feed::FeedSource;
use crate::list::MessageList;
use crate::remark::RemarkEditor;

/// Central application state.
pub struct MessageCenter<F> {
    config: ClientConfig,
    db: Database,
    ledger: Arc<AnalyticsLedger>,
    list: Arc<MessageList<F>>,
}

impl<F: FeedSource> MessageCenter<F> {
    /// Open the database (migrations run here; failure is fatal), restore
    /// the analytics ledger and build an empty list over `feed`.
    pub fn open(config: ClientConfig, feed: F) -> Result<Self, ClientError> {
        let db = match &config.database_path {
            Some(path) => Database::open_at(path)?,
            None => Database::new()?,
        };
        let version = db.schema_version()?;

        let ledger = Arc::new(AnalyticsLedger::open(db.clone())?);
        let list = Arc::new(MessageList::new(feed, db.clone(), Arc::clone(&ledger)));

        tracing::info!(schema_version = version, "message center ready");

        Ok(Self {
            config,
            db,
            ledger,
            list,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn ledger(&self) -> &Arc<AnalyticsLedger> {
        &self.ledger
    }

    pub fn list(&self) -> &Arc<MessageList<F>> {
        &self.list
    }

    /// Create a push channel whose arrivals are reconciled into the list.
    ///
    /// Must be called inside a tokio runtime. The listener task stops once
    /// the returned sender and all its clones are dropped.
    pub fn push_channel(&self) -> mpsc::Sender<Message> {
        let (tx, rx) = mpsc::channel(self.config.push_buffer);
        spawn_push_listener(Arc::clone(&self.list), rx);
        tx
    }

    /// Start editing the remark of a listed message.
    pub fn remark_editor(&self, id: &MessageId) -> Result<RemarkEditor, ClientError> {
        let message = self
            .list
            .message(id)
            .ok_or_else(|| ClientError::UnknownMessage(id.clone()))?;
        RemarkEditor::open(self.db.clone(), &message)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use msgcenter_shared::{MessageContent, MessageType};
    use msgcenter_store::migrations::CURRENT_VERSION;

    use super::*;
    use crate::feed::{FeedError, FeedPage};
    use crate::list::LoadOutcome;

    struct OnePage;

    impl FeedSource for OnePage {
        async fn fetch_page(&self, page: usize) -> Result<FeedPage, FeedError> {
            if page > 0 {
                return Ok(FeedPage::default());
            }
            Ok(FeedPage::new(vec![message("feed-1")], false))
        }
    }

    fn message(id: &str) -> Message {
        Message {
            id: MessageId::new(id),
            avatar: String::new(),
            nickname: "Carol".into(),
            timestamp: Utc::now(),
            summary: "see you".into(),
            message_type: MessageType::Friend,
            is_read: false,
            unread_count: 2,
            remark: None,
            is_pinned: false,
            content: MessageContent::text("see you"),
        }
    }

    fn config_in(dir: &tempfile::TempDir) -> ClientConfig {
        ClientConfig {
            database_path: Some(dir.path().join("nested").join("center.sqlite")),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let center = MessageCenter::open(config_in(&dir), OnePage).unwrap();
            assert_eq!(center.database().schema_version().unwrap(), CURRENT_VERSION);
            assert_eq!(center.list().load_initial().await, LoadOutcome::Applied);
            center.list().mark_as_read(&MessageId::new("feed-1")).unwrap();

            let mut editor = center.remark_editor(&MessageId::new("feed-1")).unwrap();
            editor.set_text("Coworker");
            let saved = editor.save().unwrap();
            center.list().update_remark(&MessageId::new("feed-1"), &saved);
        }

        let center = MessageCenter::open(config_in(&dir), OnePage).unwrap();
        center.list().load_initial().await;

        let restored = center.list().message(&MessageId::new("feed-1")).unwrap();
        assert!(restored.is_read);
        assert_eq!(restored.display_name(), "Coworker");
        assert_eq!(center.list().total_unread(), 0);
        assert_eq!(center.ledger().total_stats().unwrap().total_read, 0);
        assert_eq!(center.ledger().total_stats().unwrap().total_displayed, 2);
    }

    #[tokio::test]
    async fn push_channel_feeds_the_list() {
        let dir = tempfile::tempdir().unwrap();
        let center = MessageCenter::open(config_in(&dir), OnePage).unwrap();
        center.list().load_initial().await;

        let tx = center.push_channel();
        tx.send(message("push-1")).await.unwrap();

        // The listener runs on its own task; poll until it catches up.
        for _ in 0..100 {
            if center.list().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert_eq!(center.list().messages()[0].id, MessageId::new("push-1"));
        assert_eq!(center.list().total_unread(), 4);
    }

    #[tokio::test]
    async fn remark_editor_requires_listed_message() {
        let dir = tempfile::tempdir().unwrap();
        let center = MessageCenter::open(config_in(&dir), OnePage).unwrap();

        assert!(matches!(
            center.remark_editor(&MessageId::new("nope")),
            Err(ClientError::UnknownMessage(_))
        ));
    }
}

//! Push delivery: a background task that drains pushed messages into the list.

use std::sync::Arc;

use msgcenter_shared::Message;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::feed::FeedSource;
use crate::list::MessageList;

/// Forward every message received on `rx` to [`MessageList::handle_pushed`].
///
/// The task ends once every sender has been dropped.
pub fn spawn_push_listener<F: FeedSource>(
    list: Arc<MessageList<F>>,
    mut rx: mpsc::Receiver<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::debug!("push listener started");
        while let Some(message) = rx.recv().await {
            list.handle_pushed(message);
        }
        tracing::debug!("push channel closed, listener exiting");
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use msgcenter_shared::{MessageContent, MessageId, MessageType};
    use msgcenter_store::{AnalyticsLedger, Database};

    use super::*;
    use crate::feed::{FeedError, FeedPage};

    struct EmptyFeed;

    impl FeedSource for EmptyFeed {
        async fn fetch_page(&self, _page: usize) -> Result<FeedPage, FeedError> {
            Ok(FeedPage::default())
        }
    }

    fn pushed(id: &str) -> Message {
        Message {
            id: MessageId::new(id),
            avatar: String::new(),
            nickname: "system".into(),
            timestamp: Utc::now(),
            summary: "maintenance tonight".into(),
            message_type: MessageType::System,
            is_read: false,
            unread_count: 1,
            remark: None,
            is_pinned: false,
            content: MessageContent::text("maintenance tonight"),
        }
    }

    #[tokio::test]
    async fn listener_drains_channel_into_list() {
        let db = Database::open_in_memory().unwrap();
        let ledger = Arc::new(AnalyticsLedger::open(db.clone()).unwrap());
        let list = Arc::new(MessageList::new(EmptyFeed, db, Arc::clone(&ledger)));

        let (tx, rx) = mpsc::channel(8);
        let handle = spawn_push_listener(Arc::clone(&list), rx);

        tx.send(pushed("p1")).await.unwrap();
        tx.send(pushed("p2")).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.total_unread(), 2);
        let system = ledger.today_stats().unwrap().type_stats[&MessageType::System];
        assert_eq!(system.received, 2);
        assert_eq!(system.displayed, 2);
    }
}

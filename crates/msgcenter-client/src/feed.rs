//! The upstream feed seam.
//!
//! Paging, latency and failure simulation live behind [`FeedSource`]; the
//! reconciler only sees a page of messages and whether more are available.

use std::future::Future;

use msgcenter_shared::Message;
use thiserror::Error;

/// One page of feed messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedPage {
    pub messages: Vec<Message>,
    pub has_more: bool,
}

impl FeedPage {
    pub fn new(messages: Vec<Message>, has_more: bool) -> Self {
        Self { messages, has_more }
    }
}

/// Upstream failure. The `Display` text is shown to the user as-is.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("Request timed out, please try again")]
    Timeout,

    #[error("Network unavailable, please check your connection and retry")]
    NoConnection,

    #[error("Server error ({0})")]
    Server(u16),

    #[error("{0}")]
    Other(String),
}

/// Paged source of feed messages.
pub trait FeedSource: Send + Sync + 'static {
    /// Fetch the zero-based page `page`.
    fn fetch_page(&self, page: usize) -> impl Future<Output = Result<FeedPage, FeedError>> + Send;

    /// Fetch the first page again for a pull-to-refresh.
    fn refresh(&self) -> impl Future<Output = Result<FeedPage, FeedError>> + Send {
        self.fetch_page(0)
    }
}

//! # msgcenter-client
//!
//! The in-memory side of the message center: the reconciled message list,
//! the feed and push seams that fill it, search and highlighting, the
//! remark editor, and the [`MessageCenter`] context that wires them to the
//! store.

pub mod config;
pub mod events;
pub mod feed;
pub mod list;
pub mod remark;
pub mod search;
pub mod state;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use error::ClientError;
pub use events::spawn_push_listener;
pub use feed::{FeedError, FeedPage, FeedSource};
pub use list::{LoadOutcome, LoadingState, MessageList};
pub use remark::RemarkEditor;
pub use search::HighlightSpan;
pub use state::MessageCenter;

/// Install the global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice is harmless;
/// the second call leaves the first subscriber in place.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();

    if installed.is_ok() {
        tracing::info!("message center logging initialised");
    }
}

//! # msgcenter-shared
//!
//! Feed-side domain types shared by the store and the client: message
//! identifiers, categories, the tagged content body, and the transient
//! [`Message`] entity the list reconciler works on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::ParseError;
pub use types::{Message, MessageContent, MessageId, MessageType};

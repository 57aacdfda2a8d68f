use thiserror::Error;

/// Failure to decode a persisted or wire-level tag back into a domain enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("Unknown message event: {0}")]
    UnknownMessageEvent(String),
}

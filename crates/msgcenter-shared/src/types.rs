use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Stable, globally unique message identifier supplied by the feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Category of a conversation in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Friend,
    System,
    Live,
    Comment,
    Promotion,
}

impl MessageType {
    pub const ALL: [MessageType; 5] = [
        MessageType::Friend,
        MessageType::System,
        MessageType::Live,
        MessageType::Comment,
        MessageType::Promotion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friend => "friend",
            Self::System => "system",
            Self::Live => "live",
            Self::Comment => "comment",
            Self::Promotion => "promotion",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "friend" => Ok(Self::Friend),
            "system" => Ok(Self::System),
            "live" => Ok(Self::Live),
            "comment" => Ok(Self::Comment),
            "promotion" => Ok(Self::Promotion),
            other => Err(ParseError::UnknownMessageType(other.to_string())),
        }
    }
}

/// Body of a message. Each variant carries only the fields valid for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: String,
    },
    Image {
        text: String,
        image_url: String,
    },
    Button {
        text: String,
        button_text: String,
        action: String,
    },
}

impl MessageContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(text: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self::Image {
            text: text.into(),
            image_url: image_url.into(),
        }
    }

    pub fn button(
        text: impl Into<String>,
        button_text: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self::Button {
            text: text.into(),
            button_text: button_text.into(),
            action: action.into(),
        }
    }

    /// The body text common to every variant; searched alongside the summary.
    pub fn body_text(&self) -> &str {
        match self {
            Self::Text { text } | Self::Image { text, .. } | Self::Button { text, .. } => text,
        }
    }

    pub fn button_action(&self) -> Option<&str> {
        match self {
            Self::Button { action, .. } => Some(action),
            _ => None,
        }
    }
}

/// A feed entry as shown to the user.
///
/// Built from a fetched or pushed payload, then overlaid with the persisted
/// read/pin state and remark. Never persisted as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    /// Avatar URL or a built-in icon name.
    pub avatar: String,
    pub nickname: String,
    pub timestamp: DateTime<Utc>,
    pub summary: String,
    pub message_type: MessageType,
    pub is_read: bool,
    /// Additional unseen occurrences of this conversation.
    pub unread_count: u32,
    /// User-private display-name override, if any.
    pub remark: Option<String>,
    pub is_pinned: bool,
    pub content: MessageContent,
}

impl Message {
    /// Remark if set and non-empty, otherwise the nickname.
    pub fn display_name(&self) -> &str {
        match self.remark.as_deref() {
            Some(remark) if !remark.is_empty() => remark,
            _ => &self.nickname,
        }
    }
}

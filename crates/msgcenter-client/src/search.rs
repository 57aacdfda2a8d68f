//! Case-insensitive search over the message list and keyword highlighting.

use serde::Serialize;

use msgcenter_shared::Message;

/// A run of text that either matches the keyword or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HighlightSpan {
    pub text: String,
    pub is_highlighted: bool,
}

impl HighlightSpan {
    fn new(text: &str, is_highlighted: bool) -> Self {
        Self {
            text: text.to_string(),
            is_highlighted,
        }
    }
}

/// Whether `message` matches `query` on display name, summary or body.
///
/// An empty query matches everything.
pub fn matches(message: &Message, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();

    [
        message.display_name(),
        message.summary.as_str(),
        message.content.body_text(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&needle))
}

/// Keep the messages matching `query`, preserving their order.
pub fn filter(messages: &[Message], query: &str) -> Vec<Message> {
    messages
        .iter()
        .filter(|m| matches(m, query))
        .cloned()
        .collect()
}

/// Split `text` into highlighted and plain spans.
///
/// Occurrences of `keyword` are found case-insensitively, left to right,
/// without overlap. Highlighted spans keep the original casing. An empty
/// keyword, or no match, yields the whole text as one plain span.
pub fn highlight(text: &str, keyword: &str) -> Vec<HighlightSpan> {
    let needle: Vec<char> = keyword.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return vec![HighlightSpan::new(text, false)];
    }

    let mut spans = Vec::new();
    let mut plain_start = 0;
    let mut cursor = 0;

    while cursor < text.len() {
        match match_at(&text[cursor..], &needle) {
            Some(len) => {
                if plain_start < cursor {
                    spans.push(HighlightSpan::new(&text[plain_start..cursor], false));
                }
                spans.push(HighlightSpan::new(&text[cursor..cursor + len], true));
                cursor += len;
                plain_start = cursor;
            }
            None => {
                cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if plain_start < text.len() {
        spans.push(HighlightSpan::new(&text[plain_start..], false));
    }

    if spans.is_empty() {
        spans.push(HighlightSpan::new(text, false));
    }
    spans
}

/// Byte length of the prefix of `haystack` whose lowercase form equals
/// `needle`, if any. Matches end on a char boundary.
fn match_at(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut remaining = needle;

    for (idx, ch) in haystack.char_indices() {
        for lower in ch.to_lowercase() {
            match remaining.split_first() {
                Some((first, rest)) if *first == lower => remaining = rest,
                _ => return None,
            }
        }
        if remaining.is_empty() {
            return Some(idx + ch.len_utf8());
        }
    }
    None
}

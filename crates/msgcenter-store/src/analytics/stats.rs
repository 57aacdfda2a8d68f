//! Event and counter types for the analytics ledger.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use msgcenter_shared::constants::{DATE_KEY_FORMAT, TOTAL_STATS_KEY};
use msgcenter_shared::{MessageId, MessageType, ParseError};

/// Lifecycle occurrence tracked for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageEvent {
    Received,
    Displayed,
    Clicked,
    Read,
    ButtonClicked,
}

impl MessageEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Displayed => "displayed",
            Self::Clicked => "clicked",
            Self::Read => "read",
            Self::ButtonClicked => "button_clicked",
        }
    }
}

impl std::fmt::Display for MessageEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageEvent {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "displayed" => Ok(Self::Displayed),
            "clicked" => Ok(Self::Clicked),
            "read" => Ok(Self::Read),
            "button_clicked" => Ok(Self::ButtonClicked),
            other => Err(ParseError::UnknownMessageEvent(other.to_string())),
        }
    }
}

/// One entry of the append-only event log. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: Uuid,
    pub event: MessageEvent,
    pub message_id: MessageId,
    pub message_type: MessageType,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn new(
        event: MessageEvent,
        message_id: MessageId,
        message_type: MessageType,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event,
            message_id,
            message_type,
            timestamp,
        }
    }
}

/// Per-category funnel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStats {
    pub received: u64,
    pub displayed: u64,
    pub clicked: u64,
    pub read: u64,
}

impl TypeStats {
    /// clicked / received, in percent.
    pub fn recall_rate(&self) -> f64 {
        percent(self.clicked, self.received)
    }

    /// clicked / displayed, in percent.
    pub fn ctr(&self) -> f64 {
        percent(self.clicked, self.displayed)
    }
}

/// Counters for one calendar day, or for the lifetime row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// `YYYY-MM-DD`, or `total` for the lifetime row.
    pub date_string: String,
    pub total_received: u64,
    pub total_displayed: u64,
    pub total_clicked: u64,
    pub total_read: u64,
    pub unread_count: u64,
    #[serde(default)]
    pub type_stats: BTreeMap<MessageType, TypeStats>,
}

impl DailyStats {
    pub fn new(date_string: impl Into<String>) -> Self {
        Self {
            date_string: date_string.into(),
            total_received: 0,
            total_displayed: 0,
            total_clicked: 0,
            total_read: 0,
            unread_count: 0,
            type_stats: BTreeMap::new(),
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::new(date_key(date))
    }

    pub fn lifetime() -> Self {
        Self::new(TOTAL_STATS_KEY)
    }

    /// clicked / displayed, in percent.
    pub fn ctr(&self) -> f64 {
        percent(self.total_clicked, self.total_displayed)
    }

    /// read / received, in percent.
    pub fn read_rate(&self) -> f64 {
        percent(self.total_read, self.total_received)
    }

    /// clicked / received, in percent.
    pub fn recall_rate(&self) -> f64 {
        percent(self.total_clicked, self.total_received)
    }

    /// Calendar day of this row; `None` for the lifetime row.
    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date_string, DATE_KEY_FORMAT).ok()
    }

    /// Fold one event into the counters.
    pub fn apply(&mut self, event: MessageEvent, message_type: MessageType) {
        let by_type = self.type_stats.entry(message_type).or_default();

        match event {
            MessageEvent::Received => {
                self.total_received += 1;
                self.unread_count += 1;
                by_type.received += 1;
            }
            MessageEvent::Displayed => {
                self.total_displayed += 1;
                by_type.displayed += 1;
            }
            MessageEvent::Clicked | MessageEvent::ButtonClicked => {
                self.total_clicked += 1;
                by_type.clicked += 1;
            }
            MessageEvent::Read => {
                self.total_read += 1;
                self.unread_count = self.unread_count.saturating_sub(1);
                by_type.read += 1;
            }
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub today: DailyStats,
    /// Last seven calendar days, most recent first, today included.
    pub weekly: Vec<DailyStats>,
    pub total: DailyStats,
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

fn percent(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_are_zero_without_denominator() {
        let stats = DailyStats::new("2024-05-01");
        assert_eq!(stats.ctr(), 0.0);
        assert_eq!(stats.read_rate(), 0.0);
        assert_eq!(stats.recall_rate(), 0.0);

        let by_type = TypeStats::default();
        assert_eq!(by_type.recall_rate(), 0.0);
        assert_eq!(by_type.ctr(), 0.0);
    }

    #[test]
    fn received_then_read_funnel() {
        let mut stats = DailyStats::new("2024-05-01");
        for _ in 0..8 {
            stats.apply(MessageEvent::Received, MessageType::Friend);
        }
        for _ in 0..6 {
            stats.apply(MessageEvent::Read, MessageType::Friend);
        }

        assert_eq!(stats.total_received, 8);
        assert_eq!(stats.total_read, 6);
        assert_eq!(stats.unread_count, 2);
        assert_eq!(stats.read_rate(), 75.0);
        assert_eq!(stats.type_stats[&MessageType::Friend].read, 6);
    }

    #[test]
    fn read_never_underflows_unread() {
        let mut stats = DailyStats::new("2024-05-01");
        stats.apply(MessageEvent::Read, MessageType::System);
        assert_eq!(stats.unread_count, 0);
        assert_eq!(stats.total_read, 1);
    }

    #[test]
    fn button_click_counts_as_click() {
        let mut stats = DailyStats::new("2024-05-01");
        stats.apply(MessageEvent::Displayed, MessageType::Promotion);
        stats.apply(MessageEvent::Displayed, MessageType::Promotion);
        stats.apply(MessageEvent::ButtonClicked, MessageType::Promotion);

        assert_eq!(stats.total_clicked, 1);
        assert_eq!(stats.ctr(), 50.0);
        let promo = stats.type_stats[&MessageType::Promotion];
        assert_eq!(promo.clicked, 1);
        assert_eq!(promo.ctr(), 50.0);
    }

    #[test]
    fn per_type_recall_rate() {
        let mut stats = DailyStats::lifetime();
        for _ in 0..4 {
            stats.apply(MessageEvent::Received, MessageType::Live);
        }
        stats.apply(MessageEvent::Clicked, MessageType::Live);

        assert_eq!(stats.type_stats[&MessageType::Live].recall_rate(), 25.0);
        assert!(stats.date().is_none());
    }

    #[test]
    fn event_tags_parse_back() {
        for event in [
            MessageEvent::Received,
            MessageEvent::Displayed,
            MessageEvent::Clicked,
            MessageEvent::Read,
            MessageEvent::ButtonClicked,
        ] {
            assert_eq!(event.as_str().parse::<MessageEvent>().unwrap(), event);
        }
        assert!("swiped".parse::<MessageEvent>().is_err());
    }

    #[test]
    fn daily_stats_json_uses_type_tags_as_keys() {
        let mut stats = DailyStats::new("2024-05-01");
        stats.apply(MessageEvent::Received, MessageType::Comment);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["type_stats"]["comment"]["received"], 1);
    }
}

//! Funnel analytics: event log, daily/weekly/lifetime counters and the
//! derived rates (recall, CTR, read rate).

mod ledger;
mod persist;
mod stats;

pub use ledger::{AnalyticsLedger, Clock, SystemClock};
pub use stats::{date_key, AnalyticsSnapshot, DailyStats, EventRecord, MessageEvent, TypeStats};

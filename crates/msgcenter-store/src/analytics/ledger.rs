//! The analytics ledger: appends lifecycle events and keeps today's,
//! the weekly and the lifetime counters in step with them.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, NaiveDate, Utc};

use msgcenter_shared::constants::WEEKLY_WINDOW_DAYS;
use msgcenter_shared::{Message, MessageId, MessageType};

use super::persist::{SLOT_TODAY, SLOT_TOTAL, SLOT_WEEKLY};
use super::stats::{date_key, AnalyticsSnapshot, DailyStats, EventRecord, MessageEvent};
use crate::database::Database;
use crate::error::{Result, StoreError};

/// Source of the current instant and calendar day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The local calendar day used to key daily rows.
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time; days follow the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

struct LedgerState {
    today: DailyStats,
    total: DailyStats,
    /// One row per archived day, most recent first.
    weekly: Vec<DailyStats>,
}

impl LedgerState {
    fn fresh(today: NaiveDate) -> Self {
        let mut state = Self {
            today: DailyStats::for_date(today),
            total: DailyStats::lifetime(),
            weekly: Vec::new(),
        };
        state.backfill(today);
        state
    }

    /// Swap in a zeroed row if the calendar day changed. The stale row is
    /// archived into the weekly history as-is.
    fn roll_over(&mut self, today: NaiveDate) -> bool {
        let key = date_key(today);
        if self.today.date_string == key {
            return false;
        }

        let stale = std::mem::replace(&mut self.today, DailyStats::new(key));
        self.archive(stale);
        true
    }

    fn archive(&mut self, day: DailyStats) {
        self.weekly.retain(|d| d.date_string != day.date_string);
        self.weekly.push(day);
        self.weekly
            .sort_by(|a, b| b.date_string.cmp(&a.date_string));
        self.weekly.truncate(WEEKLY_WINDOW_DAYS);
    }

    /// Seed the weekly history with zeroed rows for the window ending today.
    fn backfill(&mut self, today: NaiveDate) {
        self.weekly = window_dates(today).map(DailyStats::for_date).collect();
    }

    fn weekly_window(&self, today: NaiveDate) -> Vec<DailyStats> {
        window_dates(today)
            .map(|date| {
                let key = date_key(date);
                if self.today.date_string == key {
                    return self.today.clone();
                }
                self.weekly
                    .iter()
                    .find(|d| d.date_string == key)
                    .cloned()
                    .unwrap_or_else(|| DailyStats::new(key))
            })
            .collect()
    }
}

/// Calendar days of the weekly window, most recent first.
fn window_dates(today: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    (0..WEEKLY_WINDOW_DAYS as i64).map(move |offset| today - chrono::Duration::days(offset))
}

/// Append-only event ledger with rolling daily, weekly and lifetime counters.
///
/// One instance owns the counters; callers on any task share it behind an
/// `Arc`. Each [`record`](Self::record) applies the event to today's and the
/// lifetime row and persists both, plus the weekly history, in one
/// transaction while holding the ledger lock.
pub struct AnalyticsLedger {
    db: Database,
    clock: Arc<dyn Clock>,
    state: Mutex<LedgerState>,
}

impl AnalyticsLedger {
    /// Open the ledger on the system clock.
    pub fn open(db: Database) -> Result<Self> {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    /// Open the ledger, restoring the persisted counters.
    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Result<Self> {
        let today = clock.today();

        let stored_today: Option<DailyStats> = db.load_stats_slot(SLOT_TODAY)?;
        let stored_total: Option<DailyStats> = db.load_stats_slot(SLOT_TOTAL)?;
        let stored_weekly: Option<Vec<DailyStats>> = db.load_stats_slot(SLOT_WEEKLY)?;

        let mut state = LedgerState {
            today: stored_today.unwrap_or_else(|| DailyStats::for_date(today)),
            total: stored_total.unwrap_or_else(DailyStats::lifetime),
            weekly: stored_weekly.unwrap_or_default(),
        };

        if state.weekly.is_empty() {
            tracing::info!("backfilling weekly analytics history");
            state.backfill(today);
        }
        if state.roll_over(today) {
            tracing::info!(date = %state.today.date_string, "analytics day rolled over on open");
        }

        db.persist_stats(&state.today, &state.total, &state.weekly)?;

        Ok(Self {
            db,
            clock,
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, LedgerState>> {
        self.state.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Record one lifecycle event.
    ///
    /// The in-memory counters keep the update even if persisting it fails;
    /// the failure is logged and returned.
    pub fn record(
        &self,
        event: MessageEvent,
        message_id: &MessageId,
        message_type: MessageType,
    ) -> Result<EventRecord> {
        let record = EventRecord::new(event, message_id.clone(), message_type, self.clock.now());

        let mut state = self.lock()?;
        if state.roll_over(self.clock.today()) {
            tracing::info!(date = %state.today.date_string, "analytics day rolled over");
        }

        state.today.apply(event, message_type);
        state.total.apply(event, message_type);

        tracing::debug!(
            event = %event,
            message_type = %message_type,
            message_id = %message_id,
            "analytics event"
        );

        if let Err(e) = self
            .db
            .persist_event(&record, &state.today, &state.total, &state.weekly)
        {
            tracing::error!(event = %event, message_id = %message_id, error = %e, "failed to persist analytics event");
            return Err(e);
        }

        Ok(record)
    }

    pub fn track_received(&self, message: &Message) -> Result<EventRecord> {
        self.record(MessageEvent::Received, &message.id, message.message_type)
    }

    pub fn track_displayed(&self, message: &Message) -> Result<EventRecord> {
        self.record(MessageEvent::Displayed, &message.id, message.message_type)
    }

    pub fn track_clicked(&self, message: &Message) -> Result<EventRecord> {
        self.record(MessageEvent::Clicked, &message.id, message.message_type)
    }

    pub fn track_read(&self, message: &Message) -> Result<EventRecord> {
        self.record(MessageEvent::Read, &message.id, message.message_type)
    }

    pub fn track_button_clicked(&self, message: &Message, action: &str) -> Result<EventRecord> {
        tracing::debug!(message_id = %message.id, action, "button clicked");
        self.record(MessageEvent::ButtonClicked, &message.id, message.message_type)
    }

    /// Counters for the current calendar day.
    pub fn today_stats(&self) -> Result<DailyStats> {
        let mut state = self.lock()?;
        state.roll_over(self.clock.today());
        Ok(state.today.clone())
    }

    /// Lifetime counters.
    pub fn total_stats(&self) -> Result<DailyStats> {
        Ok(self.lock()?.total.clone())
    }

    /// The last seven calendar days, most recent first, today included.
    pub fn weekly_stats(&self) -> Result<Vec<DailyStats>> {
        let today = self.clock.today();
        let mut state = self.lock()?;
        state.roll_over(today);
        Ok(state.weekly_window(today))
    }

    /// Consistent view of all three counter sets.
    pub fn snapshot(&self) -> Result<AnalyticsSnapshot> {
        let today = self.clock.today();
        let mut state = self.lock()?;
        state.roll_over(today);

        Ok(AnalyticsSnapshot {
            today: state.today.clone(),
            weekly: state.weekly_window(today),
            total: state.total.clone(),
        })
    }

    /// Most recent events first.
    pub fn recent_events(&self, limit: u32) -> Result<Vec<EventRecord>> {
        self.db.recent_events(limit)
    }

    /// Clear the event log and every counter, including the lifetime row.
    pub fn reset(&self) -> Result<()> {
        let mut state = self.lock()?;
        self.db.clear_analytics()?;

        *state = LedgerState::fresh(self.clock.today());
        self.db
            .persist_stats(&state.today, &state.total, &state.weekly)?;

        tracing::info!("analytics reset");
        Ok(())
    }
}

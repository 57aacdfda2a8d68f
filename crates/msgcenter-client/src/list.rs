//! The message list: merges feed pages and pushed messages with the
//! persisted read/pin state and remarks, and keeps the unread total.
//!
//! The backing collection is kept in arrival order; [`MessageList::messages`]
//! and [`MessageList::search`] return the display order computed on demand
//! (pinned first, then newest first).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use msgcenter_shared::{Message, MessageId};
use msgcenter_store::{AnalyticsLedger, Database, EventRecord, MessageState};

use crate::error::ClientError;
use crate::feed::{FeedError, FeedPage, FeedSource};
use crate::search;

/// Loading status of the list, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadingState {
    Idle,
    Loading,
    Refreshing,
    LoadingMore,
    Empty,
    /// Retryable failure with a human-readable message.
    Error(String),
}

/// What a load call did with its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The page was merged into the list.
    Applied,
    /// The call was a no-op (guard not satisfied).
    Ignored,
    /// A newer load started meanwhile; the result was dropped.
    Superseded,
    /// The feed returned an error.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reload {
    Initial,
    Refresh,
}

struct ListState {
    /// Arrival order; never sorted in place.
    messages: Vec<Message>,
    loading: LoadingState,
    has_more: bool,
    current_page: usize,
    /// Bumped by every initial load or refresh; results from older
    /// generations are discarded.
    generation: u64,
    initial_load_started: bool,
    total_unread: u32,
    /// Ids pushed while a reload was in flight. They survive the reload
    /// even when the fresh page does not contain them.
    pushed_during_reload: HashSet<MessageId>,
}

impl ListState {
    fn new() -> Self {
        Self {
            messages: Vec::new(),
            loading: LoadingState::Idle,
            has_more: true,
            current_page: 0,
            generation: 0,
            initial_load_started: false,
            total_unread: 0,
            pushed_during_reload: HashSet::new(),
        }
    }

    fn begin_reload(&mut self, loading: LoadingState) -> u64 {
        if !self.reload_in_flight() {
            self.pushed_during_reload.clear();
        }
        self.loading = loading;
        self.generation += 1;
        self.generation
    }

    fn reload_in_flight(&self) -> bool {
        matches!(self.loading, LoadingState::Loading | LoadingState::Refreshing)
    }

    /// Listed messages pushed during the reload that `fresh` lacks, in
    /// list order.
    fn pushed_missing_from(&self, fresh: &[Message]) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| self.pushed_during_reload.contains(&m.id))
            .filter(|m| !fresh.iter().any(|f| f.id == m.id))
            .cloned()
            .collect()
    }

    fn find_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    fn recompute_unread(&mut self) {
        self.total_unread = unread_total(&self.messages);
    }
}

/// Overlay persisted state and remarks onto feed messages by id.
///
/// Ids without a stored row keep the values supplied by the feed.
pub fn reconcile(
    messages: &mut [Message],
    states: &HashMap<MessageId, MessageState>,
    remarks: &HashMap<MessageId, String>,
) {
    for message in messages.iter_mut() {
        if let Some(state) = states.get(&message.id) {
            apply_state(message, state);
        }
        if let Some(remark) = remarks.get(&message.id) {
            message.remark = Some(remark.clone());
        }
    }
}

fn apply_state(message: &mut Message, state: &MessageState) {
    message.is_read = state.is_read;
    message.unread_count = state.unread_count;
    message.is_pinned = state.is_pinned;
}

/// Stable display order: pinned before unpinned, each group newest first.
pub fn sort_for_display(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.timestamp.cmp(&a.timestamp))
    });
}

/// Sum of `unread_count` over messages not yet read.
pub fn unread_total(messages: &[Message]) -> u32 {
    messages
        .iter()
        .filter(|m| !m.is_read)
        .fold(0u32, |acc, m| acc.saturating_add(m.unread_count))
}

/// Keep the first occurrence of each id, plus drop ids listed in `known`.
fn dedup_against(messages: &mut Vec<Message>, known: &[Message]) {
    let mut seen: HashSet<MessageId> = known.iter().map(|m| m.id.clone()).collect();
    messages.retain(|m| seen.insert(m.id.clone()));
}

/// The canonical, ordered, searchable message list for one session.
pub struct MessageList<F> {
    feed: F,
    db: Database,
    ledger: Arc<AnalyticsLedger>,
    state: Mutex<ListState>,
}

impl<F: FeedSource> MessageList<F> {
    pub fn new(feed: F, db: Database, ledger: Arc<AnalyticsLedger>) -> Self {
        Self {
            feed,
            db,
            ledger,
            state: Mutex::new(ListState::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// First load of page 0. Runs once per list; later calls are ignored.
    pub async fn load_initial(&self) -> LoadOutcome {
        let generation = {
            let mut state = self.lock();
            if state.initial_load_started {
                return LoadOutcome::Ignored;
            }
            state.initial_load_started = true;
            state.current_page = 0;
            state.begin_reload(LoadingState::Loading)
        };

        let result = self.feed.fetch_page(0).await;
        self.finish_reload(Reload::Initial, generation, result)
    }

    /// Reload page 0, superseding any load still in flight.
    pub async fn refresh(&self) -> LoadOutcome {
        let generation = {
            let mut state = self.lock();
            state.initial_load_started = true;
            state.begin_reload(LoadingState::Refreshing)
        };

        let result = self.feed.refresh().await;
        self.finish_reload(Reload::Refresh, generation, result)
    }

    /// Append the next page. Ignored while any load is in flight, when the
    /// list is not idle, or when the feed reported no more pages.
    pub async fn load_more(&self) -> LoadOutcome {
        let (generation, next_page) = {
            let mut state = self.lock();
            if !state.has_more || state.loading != LoadingState::Idle {
                return LoadOutcome::Ignored;
            }
            state.loading = LoadingState::LoadingMore;
            (state.generation, state.current_page + 1)
        };

        let result = self.feed.fetch_page(next_page).await;

        match result {
            Ok(page) => {
                let has_more = page.has_more;
                let mut fresh = page.messages;

                let mut state = self.lock();
                if state.generation != generation {
                    debug!(page = next_page, "discarding superseded page");
                    return LoadOutcome::Superseded;
                }

                dedup_against(&mut fresh, &state.messages);
                self.apply_persisted(&mut fresh);
                if !fresh.is_empty() {
                    debug!(page = next_page, count = fresh.len(), "appending page");
                    state.messages.extend(fresh);
                    state.current_page = next_page;
                }
                state.has_more = has_more;
                state.loading = LoadingState::Idle;
                state.recompute_unread();
                LoadOutcome::Applied
            }
            Err(e) => {
                let mut state = self.lock();
                if state.generation != generation {
                    return LoadOutcome::Superseded;
                }
                warn!(page = next_page, error = %e, "loading more messages failed");
                state.loading = LoadingState::Idle;
                LoadOutcome::Failed
            }
        }
    }

    fn finish_reload(
        &self,
        kind: Reload,
        generation: u64,
        result: Result<FeedPage, FeedError>,
    ) -> LoadOutcome {
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                let mut state = self.lock();
                if state.generation != generation {
                    return LoadOutcome::Superseded;
                }
                warn!(?kind, error = %e, "feed load failed");
                state.loading = if kind == Reload::Refresh && !state.messages.is_empty() {
                    LoadingState::Idle
                } else {
                    LoadingState::Error(e.to_string())
                };
                return LoadOutcome::Failed;
            }
        };

        let has_more = page.has_more;
        let mut fresh = page.messages;
        dedup_against(&mut fresh, &[]);

        let displayed = {
            let mut state = self.lock();
            if state.generation != generation {
                debug!(?kind, "discarding superseded load");
                return LoadOutcome::Superseded;
            }
            self.apply_persisted(&mut fresh);

            let displayed = match kind {
                Reload::Initial => fresh.clone(),
                Reload::Refresh => Vec::new(),
            };

            let mut messages = state.pushed_missing_from(&fresh);
            if !messages.is_empty() {
                debug!(?kind, kept = messages.len(), "keeping messages pushed during reload");
            }
            messages.extend(fresh);

            state.loading = if messages.is_empty() {
                LoadingState::Empty
            } else {
                LoadingState::Idle
            };
            state.messages = messages;
            state.pushed_during_reload.clear();
            state.has_more = has_more;
            state.current_page = 0;
            state.recompute_unread();

            info!(?kind, count = state.messages.len(), has_more, "message list loaded");
            displayed
        };

        for message in &displayed {
            self.track(self.ledger.track_displayed(message));
        }
        LoadOutcome::Applied
    }

    /// Reconcile `messages` from the store. Callers hold the list lock so a
    /// concurrent write-through cannot be overwritten by a stale read.
    fn apply_persisted(&self, messages: &mut [Message]) {
        if messages.is_empty() {
            return;
        }

        let states = self.db.get_all_states().unwrap_or_else(|e| {
            warn!(error = %e, "could not load message state, using feed values");
            HashMap::new()
        });
        let remarks = self.db.get_all_remarks().unwrap_or_else(|e| {
            warn!(error = %e, "could not load remarks");
            HashMap::new()
        });

        reconcile(messages, &states, &remarks);
    }

    // ------------------------------------------------------------------
    // Push arrivals
    // ------------------------------------------------------------------

    /// Reconcile one pushed message and insert it at the head of the list.
    ///
    /// Records `received`, then `displayed` once the message is in place.
    pub fn handle_pushed(&self, mut message: Message) {
        self.track(self.ledger.track_received(&message));

        {
            // Lock order is list, then store, as in the write-through paths.
            let mut state = self.lock();
            match self.db.get_state(&message.id) {
                Ok(Some(stored)) => apply_state(&mut message, &stored),
                Ok(None) => {}
                Err(e) => warn!(message_id = %message.id, error = %e, "could not load message state"),
            }
            match self.db.get_remark(&message.id) {
                Ok(Some(remark)) => message.remark = Some(remark),
                Ok(None) => {}
                Err(e) => warn!(message_id = %message.id, error = %e, "could not load remark"),
            }

            state.messages.retain(|m| m.id != message.id);
            state.messages.insert(0, message.clone());
            if state.reload_in_flight() {
                state.pushed_during_reload.insert(message.id.clone());
            }
            state.recompute_unread();
        }

        info!(message_id = %message.id, message_type = %message.message_type, "pushed message inserted");
        self.track(self.ledger.track_displayed(&message));
    }

    // ------------------------------------------------------------------
    // User mutations
    // ------------------------------------------------------------------

    /// Mark a message read and write it through to the state store before
    /// returning. The in-memory change stands even if the write fails.
    pub fn mark_as_read(&self, id: &MessageId) -> Result<(), ClientError> {
        let mut state = self.lock();
        let message = state
            .find_mut(id)
            .ok_or_else(|| ClientError::UnknownMessage(id.clone()))?;
        message.is_read = true;
        message.unread_count = 0;
        state.recompute_unread();

        if let Err(e) = self.db.set_read_state(id, true, 0) {
            error!(message_id = %id, error = %e, "failed to persist read state");
            return Err(e.into());
        }
        Ok(())
    }

    /// Flip the pin flag and write it through. Returns the new value.
    pub fn toggle_pinned(&self, id: &MessageId) -> Result<bool, ClientError> {
        let mut state = self.lock();
        let message = state
            .find_mut(id)
            .ok_or_else(|| ClientError::UnknownMessage(id.clone()))?;
        message.is_pinned = !message.is_pinned;
        let is_pinned = message.is_pinned;

        if let Err(e) = self.db.set_pinned(id, is_pinned) {
            error!(message_id = %id, error = %e, "failed to persist pin state");
            return Err(e.into());
        }
        Ok(is_pinned)
    }

    /// Refresh the cached remark of a listed message. Does not write the
    /// remark store.
    pub fn update_remark(&self, id: &MessageId, remark: &str) -> bool {
        let mut state = self.lock();
        match state.find_mut(id) {
            Some(message) => {
                message.remark = Some(remark.to_string());
                true
            }
            None => false,
        }
    }

    /// The user opened a message: click, mark read, read.
    pub fn open_message(&self, id: &MessageId) -> Result<Message, ClientError> {
        let message = self
            .message(id)
            .ok_or_else(|| ClientError::UnknownMessage(id.clone()))?;

        self.track(self.ledger.track_clicked(&message));
        self.mark_as_read(id)?;
        self.track(self.ledger.track_read(&message));

        self.message(id)
            .ok_or_else(|| ClientError::UnknownMessage(id.clone()))
    }

    /// The user tapped the action button of a message. Returns the action
    /// identifier, or `None` if the message has no button.
    pub fn click_button(&self, id: &MessageId) -> Result<Option<String>, ClientError> {
        let message = self
            .message(id)
            .ok_or_else(|| ClientError::UnknownMessage(id.clone()))?;

        let Some(action) = message.content.button_action() else {
            return Ok(None);
        };
        self.track(self.ledger.track_button_clicked(&message, action));
        Ok(Some(action.to_string()))
    }

    /// Persist the current read/pin values of every listed message.
    pub fn seed_store(&self) -> Result<usize, ClientError> {
        let messages = self.lock().messages.clone();
        self.db.batch_set_state(&messages)?;
        Ok(messages.len())
    }

    fn track(&self, result: msgcenter_store::Result<EventRecord>) {
        if let Err(e) = result {
            warn!(error = %e, "analytics event not recorded");
        }
    }

    // ------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------

    /// All messages in display order.
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = self.lock().messages.clone();
        sort_for_display(&mut messages);
        messages
    }

    /// Messages in display order matching `query`; empty query returns all.
    pub fn search(&self, query: &str) -> Vec<Message> {
        search::filter(&self.messages(), query)
    }

    pub fn message(&self, id: &MessageId) -> Option<Message> {
        self.lock().messages.iter().find(|m| &m.id == id).cloned()
    }

    pub fn total_unread(&self) -> u32 {
        self.lock().total_unread
    }

    pub fn loading_state(&self) -> LoadingState {
        self.lock().loading.clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn current_page(&self) -> usize {
        self.lock().current_page
    }

    pub fn len(&self) -> usize {
        self.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().messages.is_empty()
    }
}

//! # msgcenter-store
//!
//! Local persistence for the message center, backed by SQLite.
//!
//! The crate exposes a cloneable `Database` handle that wraps a
//! `rusqlite::Connection` behind a mutex and provides typed helpers for the
//! per-message read/pin state and remarks, plus the `AnalyticsLedger` that
//! aggregates lifecycle events into funnel metrics.

pub mod analytics;
pub mod database;
pub mod message_state;
pub mod migrations;
pub mod models;
pub mod remarks;

mod error;

pub use analytics::{
    AnalyticsLedger, AnalyticsSnapshot, Clock, DailyStats, EventRecord, MessageEvent,
    SystemClock, TypeStats,
};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
